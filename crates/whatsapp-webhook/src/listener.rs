//! Listener coordinator: lets callers block on the next update matching an identifier.
//!
//! Keyed by [`Update::counterparty`]/[`Update::template_id`] rather than a
//! separate `(sender, recipient)` pair — several update kinds (button/list/flow
//! replies) don't carry the receiving `phone_number_id`, so the coordinator
//! keys purely on the counterparty `wa_id`, matching the spirit of the
//! "user update" identifier without requiring a field the wire doesn't send.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};

use whatsapp_core::ids::{TemplateId, WaId};
use whatsapp_core::update::Update;

/// A synchronous predicate over a decoded update.
pub type UpdateFilter = Arc<dyn Fn(&Update) -> bool + Send + Sync>;

/// The identifier a listener is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListenerIdentifier {
    /// Matches updates whose counterparty is this `wa_id`.
    UserUpdate(WaId),
    /// Matches template-status events for this template.
    TemplateStatusUpdate(TemplateId),
}

impl ListenerIdentifier {
    /// The identifier a decoded update resolves against, if any.
    #[must_use]
    pub fn of(update: &Update) -> Option<Self> {
        if let Some(template_id) = update.template_id() {
            return Some(Self::TemplateStatusUpdate(template_id.clone()));
        }
        update.counterparty().map(|wa_id| Self::UserUpdate(wa_id.clone()))
    }
}

/// Why a `listen()` call returned.
#[derive(Debug, Clone)]
pub enum ListenerOutcome {
    /// The filter matched; carries the matching update.
    Delivered(Update),
    /// The canceler matched before the filter did; carries the cancelling update.
    Canceled(Update),
    /// No match arrived before the timeout elapsed.
    Timeout(Duration),
    /// The application called [`ListenerCoordinator::stop`] explicitly.
    Stopped,
}

struct Entry {
    filter: UpdateFilter,
    canceler: UpdateFilter,
    sender: oneshot::Sender<ListenerOutcome>,
}

/// What happened when an incoming update was offered to the listener table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// No listener was registered under this identifier.
    NoListener,
    /// A listener's filter matched; it has been removed and signaled.
    Delivered,
    /// A listener's canceler matched; it has been removed and signaled.
    Canceled,
    /// A listener exists but neither its filter nor canceler matched.
    NotMatched,
}

/// Tracks at most one active listener per [`ListenerIdentifier`].
#[derive(Default)]
pub struct ListenerCoordinator {
    table: Mutex<HashMap<ListenerIdentifier, Entry>>,
}

impl ListenerCoordinator {
    /// Construct an empty coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener and block until it resolves or the timeout elapses.
    ///
    /// At most one listener may be active per identifier; registering a
    /// second one for the same identifier replaces (and implicitly stops) the first.
    pub async fn listen(
        &self,
        identifier: ListenerIdentifier,
        filter: UpdateFilter,
        canceler: UpdateFilter,
        timeout: Duration,
    ) -> ListenerOutcome {
        let (tx, rx) = oneshot::channel();
        {
            let mut table = self.table.lock().await;
            if let Some(previous) = table.insert(identifier.clone(), Entry { filter, canceler, sender: tx }) {
                let _ = previous.sender.send(ListenerOutcome::Stopped);
            }
        }
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => ListenerOutcome::Stopped,
            Err(_) => {
                self.table.lock().await.remove(&identifier);
                ListenerOutcome::Timeout(timeout)
            }
        }
    }

    /// Explicitly stop the listener at `identifier`, if any.
    pub async fn stop(&self, identifier: &ListenerIdentifier) {
        if let Some(entry) = self.table.lock().await.remove(identifier) {
            let _ = entry.sender.send(ListenerOutcome::Stopped);
        }
    }

    /// Offer a decoded update to the listener registered at `identifier`.
    pub async fn resolve(&self, identifier: &ListenerIdentifier, update: &Update) -> Resolution {
        let mut table = self.table.lock().await;
        let matches_filter = table.get(identifier).is_some_and(|entry| (entry.filter)(update));
        if matches_filter {
            let entry = table.remove(identifier).expect("checked above");
            let _ = entry.sender.send(ListenerOutcome::Delivered(update.clone()));
            return Resolution::Delivered;
        }
        let matches_canceler = table.get(identifier).is_some_and(|entry| (entry.canceler)(update));
        if matches_canceler {
            let entry = table.remove(identifier).expect("checked above");
            let _ = entry.sender.send(ListenerOutcome::Canceled(update.clone()));
            return Resolution::Canceled;
        }
        if table.contains_key(identifier) { Resolution::NotMatched } else { Resolution::NoListener }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatsapp_core::ids::MessageId;
    use whatsapp_core::interactive::CallbackButton;
    use std::time::Duration;

    fn button_update(from: &str) -> Update {
        Update::CallbackButton(CallbackButton {
            message_id: MessageId::new("wamid.1"),
            from: WaId::new(from),
            data: "yes".to_string(),
            title: "Yes".to_string(),
        })
    }

    #[tokio::test]
    async fn delivers_matching_update_to_waiter() {
        let coordinator = Arc::new(ListenerCoordinator::new());
        let identifier = ListenerIdentifier::UserUpdate(WaId::new("972544401243"));
        let waiter = {
            let coordinator = coordinator.clone();
            let identifier = identifier.clone();
            tokio::spawn(async move {
                coordinator
                    .listen(identifier, Arc::new(|_| true), Arc::new(|_| false), Duration::from_secs(5))
                    .await
            })
        };
        tokio::task::yield_now().await;
        let update = button_update("972544401243");
        let resolution = coordinator.resolve(&identifier, &update).await;
        assert_eq!(resolution, Resolution::Delivered);
        assert!(matches!(waiter.await.unwrap(), ListenerOutcome::Delivered(_)));
    }

    #[tokio::test]
    async fn times_out_when_nothing_arrives() {
        let coordinator = ListenerCoordinator::new();
        let identifier = ListenerIdentifier::UserUpdate(WaId::new("972544401243"));
        let outcome = coordinator
            .listen(identifier, Arc::new(|_| true), Arc::new(|_| false), Duration::from_millis(10))
            .await;
        assert!(matches!(outcome, ListenerOutcome::Timeout(_)));
    }
}
