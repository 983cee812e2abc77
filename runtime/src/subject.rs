//! Reactive subjects with explicit subscription handles.
//!
//! - [`StateSubject`] holds a latest value; new subscribers receive it
//!   immediately, then every subsequent value.
//! - [`EventSubject`] holds nothing; subscribers only see values sent after
//!   they subscribed.
//! - [`Subscription`] releases its registration when dropped or cancelled.
//! - [`debounce`] forwards the last value of a burst once the source has
//!   been quiet for a window.
//!
//! Delivery is synchronous on the sending thread, except for `debounce`,
//! which hops onto a tokio task.

use crate::registry::Registry;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Registration handle; dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap a cancellation action
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release
    pub const fn empty() -> Self {
        Self { cancel: None }
    }

    /// Release the registration now
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

fn register<T: 'static>(
    subscribers: &Arc<Registry<Callback<T>>>,
    callback: Callback<T>,
) -> Subscription {
    let id = subscribers.insert(callback);
    let registry = Arc::downgrade(subscribers);
    Subscription::new(move || {
        if let Some(registry) = registry.upgrade() {
            registry.remove(id);
        }
    })
}

fn notify<T>(subscribers: &Registry<Callback<T>>, value: &T) {
    for callback in subscribers.snapshot() {
        callback(value);
    }
}

/// Fire-and-forget event stream
pub struct EventSubject<T> {
    subscribers: Arc<Registry<Callback<T>>>,
}

impl<T: 'static> EventSubject<T> {
    /// Create a subject without subscribers
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Registry::new()),
        }
    }

    /// Receive every value sent from now on
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        register(&self.subscribers, Arc::new(callback))
    }

    /// Deliver `value` to every current subscriber
    pub fn send(&self, value: T) {
        notify(&self.subscribers, &value);
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: 'static> Default for EventSubject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventSubject<T> {
    fn clone(&self) -> Self {
        Self {
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

/// Latest-value subject
pub struct StateSubject<T> {
    value: Arc<RwLock<T>>,
    subscribers: Arc<Registry<Callback<T>>>,
}

impl<T: Clone + 'static> StateSubject<T> {
    /// Create a subject holding `initial`
    #[must_use]
    pub fn new(initial: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(initial)),
            subscribers: Arc::new(Registry::new()),
        }
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> T {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Receive the current value now, then every later value
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        callback(&self.value());
        register(&self.subscribers, Arc::new(callback))
    }

    /// Replace the value and notify subscribers
    pub fn send(&self, value: T) {
        {
            let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
            current.clone_from(&value);
        }
        notify(&self.subscribers, &value);
    }

    /// Modify the value in place, then notify subscribers with the result.
    ///
    /// Returns whatever `modify` returns.
    pub fn update<R>(&self, modify: impl FnOnce(&mut T) -> R) -> R {
        let (output, next) = {
            let mut current = self.value.write().unwrap_or_else(PoisonError::into_inner);
            let output = modify(&mut current);
            (output, current.clone())
        };
        notify(&self.subscribers, &next);
        output
    }

    /// Number of live subscriptions
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> Clone for StateSubject<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl<T: Default + Clone + 'static> Default for StateSubject<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Forward the last value of each burst from `source` to `sink` once no new
/// value has arrived for `window`.
///
/// Runs on the current tokio runtime. Outside a runtime every value is
/// forwarded immediately. Cancelling the returned subscription drops any
/// pending value.
pub fn debounce<T, F>(source: &EventSubject<T>, window: Duration, sink: F) -> Subscription
where
    T: Clone + Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No tokio runtime available, debounce forwards immediately");
        return source.subscribe(move |value| sink(value.clone()));
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<T>();
    let upstream = source.subscribe(move |value| {
        // Receiver only goes away when the task is aborted
        let _ = tx.send(value.clone());
    });

    let task = runtime.spawn(async move {
        while let Some(mut latest) = rx.recv().await {
            loop {
                match tokio::time::timeout(window, rx.recv()).await {
                    Ok(Some(next)) => latest = next,
                    Ok(None) => {
                        sink(latest);
                        return;
                    }
                    Err(_elapsed) => break,
                }
            }
            sink(latest);
        }
    });

    Subscription::new(move || {
        drop(upstream);
        task.abort();
    })
}
