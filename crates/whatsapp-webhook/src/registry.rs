//! Handler registry: binds update kinds to ordered callback chains.
//!
//! Generic over a context type `C` (the facade the callback receives
//! alongside the update) so this crate never depends on the higher-level
//! client crate that owns that type.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use whatsapp_core::callback::CallbackData;
use whatsapp_core::update::Update;

/// A boxed, `Send` future, the shape every filter/callback closure returns.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler callback may request after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerSignal {
    /// Stop the dispatch loop for this update regardless of the registry's policy.
    StopHandling,
    /// Keep dispatching to subsequent handlers regardless of the registry's policy.
    ContinueHandling,
}

/// Discriminator mirroring [`Update`]'s variants, used as the registry's key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// See [`Update::Message`].
    Message,
    /// See [`Update::CallbackButton`].
    CallbackButton,
    /// See [`Update::CallbackSelection`].
    CallbackSelection,
    /// See [`Update::FlowCompletion`].
    FlowCompletion,
    /// See [`Update::MessageStatus`].
    MessageStatus,
    /// See [`Update::TemplateStatusUpdate`].
    TemplateStatusUpdate,
    /// See [`Update::TemplateQualityUpdate`].
    TemplateQualityUpdate,
    /// See [`Update::TemplateCategoryUpdate`].
    TemplateCategoryUpdate,
    /// See [`Update::ChatOpened`].
    ChatOpened,
    /// See [`Update::PhoneNumberChange`].
    PhoneNumberChange,
    /// See [`Update::IdentityChange`].
    IdentityChange,
    /// See [`Update::CallEvent`].
    CallEvent,
    /// See [`Update::CallStatus`].
    CallStatus,
    /// See [`Update::UserPreferencesUpdate`].
    UserPreferencesUpdate,
}

impl UpdateKind {
    /// The kind of a decoded update.
    #[must_use]
    pub const fn of(update: &Update) -> Self {
        match update {
            Update::Message(_) => Self::Message,
            Update::CallbackButton(_) => Self::CallbackButton,
            Update::CallbackSelection(_) => Self::CallbackSelection,
            Update::FlowCompletion(_) => Self::FlowCompletion,
            Update::MessageStatus(_) => Self::MessageStatus,
            Update::TemplateStatusUpdate(_) => Self::TemplateStatusUpdate,
            Update::TemplateQualityUpdate(_) => Self::TemplateQualityUpdate,
            Update::TemplateCategoryUpdate(_) => Self::TemplateCategoryUpdate,
            Update::ChatOpened(_) => Self::ChatOpened,
            Update::PhoneNumberChange(_) => Self::PhoneNumberChange,
            Update::IdentityChange(_) => Self::IdentityChange,
            Update::CallEvent(_) => Self::CallEvent,
            Update::CallStatus(_) => Self::CallStatus,
            Update::UserPreferencesUpdate(_) => Self::UserPreferencesUpdate,
        }
    }
}

/// A filter run before a handler's callback; any false short-circuits the chain.
pub type Filter<C> = Arc<dyn Fn(C, Update) -> BoxFuture<'static, bool> + Send + Sync>;

/// A handler's callback, invoked once every filter has passed.
pub type Callback<C> = Arc<dyn Fn(C, Update) -> BoxFuture<'static, Option<HandlerSignal>> + Send + Sync>;

/// A callback invoked for every decoded change, whether or not it was
/// classified into a typed [`Update`] — used for logging/fallback handling.
pub type RawCallback<C> = Arc<dyn Fn(C, String, serde_json::Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// One registered handler.
#[derive(Clone)]
pub struct Handler<C> {
    filters: Vec<Filter<C>>,
    callback: Callback<C>,
}

impl<C: Clone + Send + Sync + 'static> Handler<C> {
    /// Start building a handler for the given callback.
    #[must_use]
    pub fn new(callback: Callback<C>) -> Self {
        Self { filters: Vec::new(), callback }
    }

    /// Append a filter; all filters must pass for the callback to run.
    #[must_use]
    pub fn filter(mut self, filter: Filter<C>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Append the automatic prefix filter a structured [`CallbackData`]
    /// factory contributes: reject updates whose `data`/`tracker` string
    /// doesn't decode under the given type tag.
    #[must_use]
    pub fn callback_data_prefix(self, expected_tag: &'static str, field_count: usize, sep: char) -> Self {
        self.filter(Arc::new(move |_ctx, update| {
            let raw = callback_string(&update);
            Box::pin(async move { raw.is_some_and(|s| CallbackData::decode(&s, expected_tag, field_count, sep).is_ok()) })
        }))
    }

    async fn run(&self, ctx: C, update: &Update) -> Option<Option<HandlerSignal>> {
        for filter in &self.filters {
            if !(filter)(ctx.clone(), update.clone()).await {
                return None;
            }
        }
        Some((self.callback)(ctx, update.clone()).await)
    }
}

/// The `data`/`tracker` string carried by an update, if any — the field a
/// `CallbackData` factory inspects.
#[must_use]
pub fn callback_string(update: &Update) -> Option<String> {
    match update {
        Update::CallbackButton(b) => Some(b.data.clone()),
        Update::CallbackSelection(s) => Some(s.data.clone()),
        Update::Message(m) => m.tracker.clone(),
        Update::MessageStatus(s) => s.tracker.clone(),
        _ => None,
    }
}

/// Binds update kinds to ordered handler chains, plus a separate raw-update chain.
pub struct HandlerRegistry<C> {
    typed: HashMap<UpdateKind, Vec<Handler<C>>>,
    raw: Vec<RawCallback<C>>,
    /// When `true`, every handler whose filters pass is invoked; when
    /// `false` (the default), the first one wins.
    pub continue_handling: bool,
}

impl<C: Clone + Send + Sync + 'static> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self { typed: HashMap::new(), raw: Vec::new(), continue_handling: false }
    }
}

impl<C: Clone + Send + Sync + 'static> HandlerRegistry<C> {
    /// Construct an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for the given update kind, appended in insertion order.
    pub fn register(&mut self, kind: UpdateKind, handler: Handler<C>) {
        self.typed.entry(kind).or_default().push(handler);
    }

    /// Register a raw-update handler; it always runs last, unconditionally.
    pub fn register_raw(&mut self, callback: RawCallback<C>) {
        self.raw.push(callback);
    }

    /// Dispatch a decoded update through the typed handler chain for its kind.
    ///
    /// Returns `true` if dispatch should be considered "consumed" (a handler
    /// ran and requested `StopHandling`, or the default no-continue policy
    /// stopped after the first match).
    pub async fn dispatch_typed(&self, ctx: C, update: &Update) -> bool {
        let kind = UpdateKind::of(update);
        let Some(handlers) = self.typed.get(&kind) else { return false };
        let mut consumed = false;
        for handler in handlers {
            let Some(signal) = handler.run(ctx.clone(), update).await else { continue };
            consumed = true;
            match signal {
                Some(HandlerSignal::StopHandling) => return true,
                Some(HandlerSignal::ContinueHandling) => continue,
                None if !self.continue_handling => return true,
                None => continue,
            }
        }
        consumed
    }

    /// Invoke every raw-update handler, unconditionally and in registration order.
    pub async fn dispatch_raw(&self, ctx: C, field: &str, raw: &serde_json::Value) {
        for callback in &self.raw {
            (callback)(ctx.clone(), field.to_string(), raw.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatsapp_core::ids::{MessageId, WaId};
    use whatsapp_core::interactive::CallbackButton;

    fn button_update(data: &str) -> Update {
        Update::CallbackButton(CallbackButton {
            message_id: MessageId::new("wamid.1"),
            from: WaId::new("972544401243"),
            data: data.to_string(),
            title: "Yes".to_string(),
        })
    }

    #[tokio::test]
    async fn first_matching_handler_wins_by_default() {
        let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let c1 = calls.clone();
        registry.register(
            UpdateKind::CallbackButton,
            Handler::new(Arc::new(move |_ctx, _update| {
                let c1 = c1.clone();
                Box::pin(async move {
                    c1.lock().unwrap().push(1);
                    None
                })
            })),
        );
        let c2 = calls.clone();
        registry.register(
            UpdateKind::CallbackButton,
            Handler::new(Arc::new(move |_ctx, _update| {
                let c2 = c2.clone();
                Box::pin(async move {
                    c2.lock().unwrap().push(2);
                    None
                })
            })),
        );

        let update = button_update("yes");
        let consumed = registry.dispatch_typed((), &update).await;
        assert!(consumed);
        assert_eq!(*calls.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn callback_data_prefix_filter_rejects_mismatched_tag() {
        let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
        let calls = Arc::new(std::sync::Mutex::new(0));
        let c1 = calls.clone();
        registry.register(
            UpdateKind::CallbackButton,
            Handler::new(Arc::new(move |_ctx, _update| {
                let c1 = c1.clone();
                Box::pin(async move {
                    *c1.lock().unwrap() += 1;
                    None
                })
            }))
            .callback_data_prefix("order", 1, ':'),
        );

        let update = button_update("user:7");
        registry.dispatch_typed((), &update).await;
        assert_eq!(*calls.lock().unwrap(), 0);

        let update = button_update("order:42");
        registry.dispatch_typed((), &update).await;
        assert_eq!(*calls.lock().unwrap(), 1);
    }
}
