//! In-process event bus with typed topics.
//!
//! Broadcast-style stages publish every change as a [`TodoEvent`] and, from
//! a self-subscription, a coarser [`UiUpdate`]. Topics are typed fields rather
//! than string names, so two stages can never collide on a topic name; events
//! carry their [`SyncStage`](todo_sync_core::SyncStage) so listeners can filter.
//!
//! ```text
//! ┌──────────────┐  publish   ┌────────────────────┐
//! │ Data service │──────────▶│ todo_events topic  │
//! └──────────────┘            └─────────┬──────────┘
//!                                       │ self-subscription
//!                                       ▼
//!                             ┌────────────────────┐  listen()  ┌─────────┐
//!                             │ ui_updates topic   │──────────▶│ screens │
//!                             └────────────────────┘            └─────────┘
//! ```
//!
//! Each topic delivers twice: synchronously to handlers registered with
//! [`Topic::subscribe`], then through a tokio `broadcast` channel to async
//! listeners obtained from [`Topic::listen`]. Listeners play the role of the
//! UI thread: they pick the event up on their own task.

use crate::subject::{EventSubject, Subscription};
use tokio::sync::broadcast;
use todo_sync_core::{TodoEvent, UiUpdate};

/// Default number of events buffered per async listener
pub const DEFAULT_CAPACITY: usize = 64;

/// A typed publish/subscribe channel
pub struct Topic<E> {
    name: &'static str,
    handlers: EventSubject<E>,
    sender: broadcast::Sender<E>,
}

impl<E: Clone + Send + 'static> Topic<E> {
    /// Create a topic; `capacity` bounds each async listener's backlog
    #[must_use]
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name,
            handlers: EventSubject::new(),
            sender,
        }
    }

    /// Topic name, for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Deliver `event` to all handlers, then to all async listeners.
    ///
    /// Returns the number of async listeners that received it.
    pub fn publish(&self, event: E) -> usize {
        self.handlers.send(event.clone());
        // No listeners is not an error for an in-process bus
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::trace!(topic = self.name, delivered, "Published event");
        delivered
    }

    /// Register a synchronous handler
    pub fn subscribe(&self, handler: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        self.handlers.subscribe(handler)
    }

    /// Obtain an async receiver for events published from now on
    #[must_use]
    pub fn listen(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }

    /// Number of synchronous handlers
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.subscriber_count()
    }

    /// Number of async listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// The process-wide bus, owned by the container and injected into services
pub struct EventBus {
    todo_events: Topic<TodoEvent>,
    ui_updates: Topic<UiUpdate>,
}

impl EventBus {
    /// Create a bus with [`DEFAULT_CAPACITY`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a bus with a custom per-listener capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            todo_events: Topic::new("todo-events", capacity),
            ui_updates: Topic::new("ui-updates", capacity),
        }
    }

    /// Data change events
    #[must_use]
    pub const fn todo_events(&self) -> &Topic<TodoEvent> {
        &self.todo_events
    }

    /// Screen refresh requests
    #[must_use]
    pub const fn ui_updates(&self) -> &Topic<UiUpdate> {
        &self.ui_updates
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("todo_event_handlers", &self.todo_events.handler_count())
            .field("ui_update_listeners", &self.ui_updates.listener_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn handlers_run_synchronously() {
        let topic = Topic::new("numbers", 4);
        let total = Arc::new(AtomicUsize::new(0));
        let sum = Arc::clone(&total);
        let _subscription = topic.subscribe(move |n: &usize| {
            sum.fetch_add(*n, Ordering::SeqCst);
        });

        assert_eq!(topic.publish(2), 0);
        topic.publish(5);

        assert_eq!(total.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn listeners_receive_published_events() {
        let topic = Topic::new("words", 4);
        let mut rx = topic.listen();

        assert_eq!(topic.publish("hello"), 1);
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[test]
    fn slow_listener_lags_instead_of_blocking() {
        let topic = Topic::new("numbers", 1);
        let mut rx = topic.listen();

        topic.publish(1u8);
        topic.publish(2u8);

        let lagged = tokio_test::block_on(rx.recv());
        assert!(matches!(lagged, Err(broadcast::error::RecvError::Lagged(1))));
        assert_eq!(tokio_test::block_on(rx.recv()).unwrap(), 2);
    }

    #[test]
    fn dropped_handler_stops_receiving() {
        let topic = Topic::new("numbers", 4);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = topic.subscribe(move |_: &u8| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        topic.publish(1);
        drop(subscription);
        topic.publish(2);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(topic.handler_count(), 0);
    }
}
