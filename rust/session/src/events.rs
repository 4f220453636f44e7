use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::task::{Context, Poll};

use felt_engine::snapshot::TableSnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::Stream;

// Slow subscribers lose events once their buffer fills rather than stalling
// the table.
const EVENT_CHANNEL_BUFFER: usize = 1000;

pub type EventSender = mpsc::Sender<TableEvent>;
pub type EventReceiver = mpsc::Receiver<TableEvent>;

/// What observers of a table are told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableEvent {
    StateUpdated { snapshot: Box<TableSnapshot> },
    Message { text: String },
    /// The remote session was lost and play continues locally.
    FallbackNotice { reason: String },
    Error { code: String, message: String },
}

impl TableEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TableEvent::StateUpdated { .. } => "state_updated",
            TableEvent::Message { .. } => "message",
            TableEvent::FallbackNotice { .. } => "fallback_notice",
            TableEvent::Error { .. } => "error",
        }
    }
}

/// Live subscription to a table's events. Dropping it unsubscribes.
pub struct EventSubscription {
    bus: EventBus,
    subscriber_id: usize,
    receiver: EventReceiver,
}

impl EventSubscription {
    pub fn id(&self) -> usize {
        self.subscriber_id
    }

    pub async fn recv(&mut self) -> Option<TableEvent> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<TableEvent> {
        self.receiver.try_recv().ok()
    }

    /// Everything already queued, without waiting.
    pub fn drain(&mut self) -> Vec<TableEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    pub fn unsubscribe(self) {
        drop(self)
    }
}

impl Stream for EventSubscription {
    type Item = TableEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<TableEvent>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.subscriber_id);
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

#[derive(Debug, Default)]
struct EventBusInner {
    subscribers: RwLock<Vec<(usize, EventSender)>>,
    next_id: AtomicUsize,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> EventSubscription {
        let (tx, receiver) = mpsc::channel(EVENT_CHANNEL_BUFFER);
        let subscriber_id = self.inner.next_id.fetch_add(1, Ordering::AcqRel);
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((subscriber_id, tx));

        tracing::debug!(subscriber_id, "subscribed to table events");

        EventSubscription {
            bus: self.clone(),
            subscriber_id,
            receiver,
        }
    }

    pub fn publish(&self, event: TableEvent) {
        tracing::trace!(event_type = event.kind(), "publishing table event");

        let subscribers = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut failed = Vec::new();
        for (id, sender) in subscribers {
            if let Err(e) = sender.try_send(event.clone()) {
                tracing::warn!(
                    subscriber_id = id,
                    error = %e,
                    "failed to deliver table event"
                );
                failed.push(id);
            }
        }
        if !failed.is_empty() {
            self.remove_subscribers(&failed);
        }
    }

    pub fn unsubscribe(&self, subscriber_id: usize) {
        self.remove_subscribers(&[subscriber_id]);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn remove_subscribers(&self, ids: &[usize]) {
        let mut guard = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        guard.retain(|(id, _)| !ids.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> TableEvent {
        TableEvent::Message {
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(message("Seat 1 wins 20"));

        assert_eq!(first.recv().await, Some(message("Seat 1 wins 20")));
        assert_eq!(second.recv().await, Some(message("Seat 1 wins 20")));
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let kept = bus.subscribe();
        let dropped = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(dropped);
        assert_eq!(bus.subscriber_count(), 1);

        kept.unsubscribe();
        assert_eq!(bus.subscriber_count(), 0);

        bus.publish(message("nobody listens"));
    }

    #[tokio::test]
    async fn closed_receivers_are_pruned_on_publish() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel(1);
        bus.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((99, tx));
        drop(rx);

        bus.publish(message("hello"));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(TableEvent::FallbackNotice {
            reason: "remote session disconnected".into(),
        })
        .expect("serialize");
        assert_eq!(json["type"], "fallback_notice");
        assert_eq!(json["reason"], "remote session disconnected");
    }
}
