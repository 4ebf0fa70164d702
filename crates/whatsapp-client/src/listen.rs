//! Blocking shortcuts over the listener coordinator: wait for a specific
//! reply, button tap, list selection, flow completion, or delivery status
//! tied to a message this client just sent.

use std::sync::Arc;
use std::time::Duration;

use whatsapp_core::ids::MessageId;
use whatsapp_core::update::{DeliveryStatus, Update};
use whatsapp_graph::sent_message::SentMessage;
use whatsapp_webhook::{ListenerIdentifier, ListenerOutcome};

use crate::client::WhatsApp;
use crate::error::ListenError;

fn never(_update: &Update) -> bool {
    false
}

async fn listen_for(
    client: &WhatsApp,
    sent: &SentMessage,
    timeout: Duration,
    filter: impl Fn(&Update) -> bool + Send + Sync + 'static,
) -> Result<Update, ListenError> {
    let identifier = ListenerIdentifier::UserUpdate(sent.to_user().clone());
    let outcome = client
        .inner
        .pipeline
        .listeners()
        .listen(identifier, Arc::new(filter), Arc::new(never), timeout)
        .await;
    match outcome {
        ListenerOutcome::Delivered(update) => Ok(update),
        ListenerOutcome::Canceled(update) => Err(ListenError::Canceled(update)),
        ListenerOutcome::Timeout(d) => Err(ListenError::Timeout(d)),
        ListenerOutcome::Stopped => Err(ListenError::Stopped),
    }
}

fn replies_to(message_id: &MessageId, update: &Update) -> bool {
    matches!(update, Update::Message(m) if m.context.as_ref().is_some_and(|c| &c.id == message_id))
}

impl WhatsApp {
    /// Block until the user replies to `sent`, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Timeout`] if nothing matches in time.
    pub async fn wait_for_reply(&self, sent: &SentMessage, timeout: Duration) -> Result<whatsapp_core::message::Message, ListenError> {
        let id = sent.id().clone();
        let update = listen_for(self, sent, timeout, move |u| replies_to(&id, u)).await?;
        match update {
            Update::Message(message) => Ok(message),
            other => unreachable!("filter only matches Message updates: {other:?}"),
        }
    }

    /// Block until the user taps a button on `sent`, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Timeout`] if nothing matches in time.
    pub async fn wait_for_click(
        &self,
        sent: &SentMessage,
        timeout: Duration,
    ) -> Result<whatsapp_core::interactive::CallbackButton, ListenError> {
        let id = sent.id().clone();
        let update = listen_for(self, sent, timeout, move |u| {
            matches!(u, Update::CallbackButton(b) if b.message_id == id)
        })
        .await?;
        match update {
            Update::CallbackButton(button) => Ok(button),
            other => unreachable!("filter only matches CallbackButton updates: {other:?}"),
        }
    }

    /// Block until the user picks a row from `sent`'s list, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Timeout`] if nothing matches in time.
    pub async fn wait_for_selection(
        &self,
        sent: &SentMessage,
        timeout: Duration,
    ) -> Result<whatsapp_core::interactive::CallbackSelection, ListenError> {
        let id = sent.id().clone();
        let update = listen_for(self, sent, timeout, move |u| {
            matches!(u, Update::CallbackSelection(s) if s.message_id == id)
        })
        .await?;
        match update {
            Update::CallbackSelection(selection) => Ok(selection),
            other => unreachable!("filter only matches CallbackSelection updates: {other:?}"),
        }
    }

    /// Block until `sent`'s flow launcher completes, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Timeout`] if nothing matches in time.
    pub async fn wait_for_completion(
        &self,
        sent: &SentMessage,
        timeout: Duration,
    ) -> Result<whatsapp_core::interactive::FlowCompletion, ListenError> {
        let id = sent.id().clone();
        let update = listen_for(self, sent, timeout, move |u| {
            matches!(u, Update::FlowCompletion(f) if f.message_id == id)
        })
        .await?;
        match update {
            Update::FlowCompletion(completion) => Ok(completion),
            other => unreachable!("filter only matches FlowCompletion updates: {other:?}"),
        }
    }

    /// Block until `sent` is marked read, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Timeout`] if nothing matches in time.
    pub async fn wait_until_read(&self, sent: &SentMessage, timeout: Duration) -> Result<(), ListenError> {
        self.wait_until_status(sent, DeliveryStatus::Read, timeout).await
    }

    /// Block until `sent` is marked delivered, or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`ListenError::Timeout`] if nothing matches in time.
    pub async fn wait_until_delivered(&self, sent: &SentMessage, timeout: Duration) -> Result<(), ListenError> {
        self.wait_until_status(sent, DeliveryStatus::Delivered, timeout).await
    }

    async fn wait_until_status(&self, sent: &SentMessage, want: DeliveryStatus, timeout: Duration) -> Result<(), ListenError> {
        let id = sent.id().clone();
        listen_for(self, sent, timeout, move |u| {
            matches!(u, Update::MessageStatus(s) if s.message_id == id && s.status == want)
        })
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatsapp_core::ids::{PhoneId, WaId};

    #[test]
    fn replies_to_matches_only_the_targeted_context() {
        let target = MessageId::new("wamid.1");
        let message = whatsapp_core::message::Message {
            id: MessageId::new("wamid.2"),
            from: whatsapp_core::message::FromUser { wa_id: WaId::new("972544401243"), name: None },
            recipient_phone_id: PhoneId::new("277321005464405"),
            recipient_display_phone: "15550953877".into(),
            timestamp: chrono::DateTime::from_timestamp(1_730_231_903, 0).unwrap(),
            context: Some(whatsapp_core::message::MessageContext {
                id: target.clone(),
                from: None,
                forwarded: false,
                frequently_forwarded: false,
            }),
            tracker: None,
            payload: whatsapp_core::message::MessageType::Text(whatsapp_core::message::Text { body: "yes".into() }),
        };
        assert!(replies_to(&target, &Update::Message(message.clone())));
        assert!(!replies_to(&MessageId::new("wamid.other"), &Update::Message(message)));
    }
}
