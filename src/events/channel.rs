use super::{ChatEvent, EventKind};
use anyhow::Result;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, warn};

pub type EventHandler = Arc<dyn Fn(&ChatEvent) -> Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type HandlerTable = HashMap<EventKind, Vec<(HandlerId, EventHandler)>>;

#[derive(Default)]
struct ChannelInner {
    next_id: AtomicU64,
    handlers: Mutex<HandlerTable>,
}

impl ChannelInner {
    fn table(&self) -> MutexGuard<'_, HandlerTable> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, kind: EventKind, id: HandlerId) -> bool {
        let mut table = self.table();
        let Some(handlers) = table.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() != before;
        if removed {
            debug!(
                event = kind.name(),
                remaining = handlers.len(),
                "unsubscribed handler"
            );
        }
        removed
    }
}

/// In-process publish/subscribe hub. Clones share the same subscriber table.
///
/// Handlers run synchronously on the publishing task, in subscription order.
/// A handler that errors or panics is logged and skipped; the remaining
/// handlers for that publish still run.
#[derive(Clone, Default)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

/// Handle returned by [`EventChannel::subscribe`]. Dropping it keeps the
/// subscription alive; call [`Subscription::unsubscribe`] to detach.
pub struct Subscription {
    channel: Weak<ChannelInner>,
    kind: EventKind,
    id: HandlerId,
}

impl Subscription {
    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Detaches the handler. Returns false when the channel is gone or the
    /// handler was already removed.
    pub fn unsubscribe(self) -> bool {
        match self.channel.upgrade() {
            Some(inner) => inner.remove(self.kind, self.id),
            None => false,
        }
    }
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&ChatEvent) -> Result<()> + Send + Sync + 'static,
    {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut table = self.inner.table();
        let handlers = table.entry(kind).or_default();
        handlers.push((id, Arc::new(handler)));
        debug!(
            event = kind.name(),
            total = handlers.len(),
            "subscribed handler"
        );
        Subscription {
            channel: Arc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    pub fn unsubscribe(&self, kind: EventKind, id: HandlerId) -> bool {
        self.inner.remove(kind, id)
    }

    /// Delivers `event` to every current subscriber of its kind and returns
    /// how many handlers completed without error.
    ///
    /// The subscriber list is snapshotted before dispatch, so handlers may
    /// subscribe, unsubscribe or publish re-entrantly.
    pub fn publish(&self, event: ChatEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = self
            .inner
            .table()
            .get(&kind)
            .map(|handlers| handlers.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();
        if handlers.is_empty() {
            debug!(event = kind.name(), "published with no subscribers");
            return 0;
        }

        let mut delivered = 0;
        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => {
                    warn!(event = kind.name(), error = %err, "event handler failed");
                }
                Err(_) => {
                    warn!(event = kind.name(), "event handler panicked");
                }
            }
        }
        debug!(
            event = kind.name(),
            subscribers = handlers.len(),
            delivered,
            "published event"
        );
        delivered
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.inner.table().get(&kind).map_or(0, Vec::len)
    }

    /// Drops every handler for `kind`, or all handlers when `kind` is `None`.
    pub fn clear(&self, kind: Option<EventKind>) {
        let mut table = self.inner.table();
        match kind {
            Some(kind) => {
                table.remove(&kind);
            }
            None => table.clear(),
        }
    }
}
