//! Event relay.
//!
//! Hardware callbacks run on whatever thread the driver chooses. The relay
//! decouples them from listeners: producers push into a bounded queue through
//! an [`EventSink`], and a single dispatcher task drains the queue and invokes
//! the listeners registered for each event kind.
//!
//! ```text
//! ┌──────────────┐
//! │ SDK callback │──┐
//! └──────────────┘  │    ┌───────────────┐    ┌────────────┐    ┌───────────┐
//! ┌──────────────┐  ├───►│ Bounded queue │───►│ Dispatcher │───►│ Listeners │
//! │ Adapter      │──┤    │ (mpsc)        │    │ task       │    │ per kind  │
//! └──────────────┘  │    └───────────────┘    └────────────┘    └───────────┘
//! ┌──────────────┐  │
//! │ Trigger keys │──┘
//! └──────────────┘
//! ```
//!
//! Listeners are never invoked concurrently, and each listener sees the
//! emissions of its kind in emission order.
//!
//! Emissions are accepted only while the relay is armed (between a
//! successful `init` and a successful `free`). Emissions while disarmed, after
//! shutdown, or with a full queue are dropped and never reported to the
//! emitter as an error.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uhf_core::{BridgeEvent, Error, EventKind, Result};

/// Callback invoked for every emission on a subscribed channel.
pub type Listener = Arc<dyn Fn(&BridgeEvent) + Send + Sync>;

/// Item carried by the relay queue.
enum Envelope {
    Event(BridgeEvent),
    /// Completed once every earlier event has been dispatched.
    Flush(oneshot::Sender<()>),
}

struct ListenerEntry {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Listener,
}

/// State shared between the relay, its sinks, its dispatcher and subscriptions.
struct Shared {
    listeners: Mutex<HashMap<EventKind, Vec<Arc<ListenerEntry>>>>,
    next_id: AtomicU64,
    armed: AtomicBool,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl Shared {
    fn listeners(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Arc<ListenerEntry>>>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, kind: EventKind, id: u64) -> bool {
        let mut listeners = self.listeners();
        let Some(entries) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| {
            if entry.id == id {
                entry.active.store(false, Ordering::SeqCst);
                false
            } else {
                true
            }
        });
        entries.len() != before
    }

    fn dispatch(&self, event: &BridgeEvent) {
        let kind = event.kind();

        // Snapshot so listeners may (un)subscribe from inside a callback.
        let entries: Vec<Arc<ListenerEntry>> = self
            .listeners()
            .get(&kind)
            .map(|entries| entries.to_vec())
            .unwrap_or_default();

        trace!("Dispatching {} to {} listener(s)", kind, entries.len());

        for entry in entries {
            if !entry.active.load(Ordering::SeqCst) {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| (entry.callback)(event))).is_err() {
                warn!("Listener {} for {} panicked", entry.id, kind);
            }
        }
    }
}

/// Producer side of the relay.
///
/// Cheap to clone and safe to use from any thread, including threads owned
/// by the vendor SDK.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Envelope>,
    shared: Arc<Shared>,
}

impl EventSink {
    /// Queue an event for dispatch without blocking.
    ///
    /// Returns whether the event was queued.
    pub fn emit(&self, event: BridgeEvent) -> bool {
        let kind = event.kind();

        if self.shared.closed.load(Ordering::SeqCst) {
            trace!("Relay closed, dropping {}", kind);
            return false;
        }
        if !self.shared.armed.load(Ordering::SeqCst) {
            trace!("Reader not initialized, dropping {}", kind);
            return false;
        }

        match self.tx.try_send(Envelope::Event(event)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                let dropped = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("Event queue full, dropping {} ({} dropped so far)", kind, dropped);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                trace!("Dispatcher stopped, dropping {}", kind);
                false
            }
        }
    }

    /// Whether emissions are currently accepted.
    pub fn is_armed(&self) -> bool {
        self.shared.armed.load(Ordering::SeqCst) && !self.shared.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn arm(&self) {
        if !self.shared.armed.swap(true, Ordering::SeqCst) {
            debug!("Event relay armed");
        }
    }

    pub(crate) fn disarm(&self) {
        if self.shared.armed.swap(false, Ordering::SeqCst) {
            debug!("Event relay disarmed");
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle keeps the listener registered; call
/// [`remove`](Self::remove) to unsubscribe.
pub struct Subscription {
    kind: EventKind,
    id: u64,
    active: Arc<AtomicBool>,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Channel this listener is registered on.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Unsubscribe. The listener receives no further events, including
    /// events already queued.
    ///
    /// Returns `false` if it was already removed.
    pub fn remove(self) -> bool {
        let was_active = self.active.swap(false, Ordering::SeqCst);
        match self.shared.upgrade() {
            Some(shared) => shared.remove(self.kind, self.id) || was_active,
            None => was_active,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Fan-out of bridge events to registered listeners.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use uhf_bridge::EventRelay;
/// use uhf_core::{BridgeEvent, EventKind};
///
/// #[tokio::main]
/// async fn main() -> uhf_core::Result<()> {
///     let relay = EventRelay::new(16)?;
///     let seen = Arc::new(Mutex::new(Vec::new()));
///
///     let log = Arc::clone(&seen);
///     relay.subscribe(EventKind::InventoryStart, move |event: &BridgeEvent| {
///         log.lock().unwrap().push(event.kind());
///     });
///
///     // Not armed yet: dropped
///     assert!(!relay.sink().emit(BridgeEvent::InventoryStart));
///     relay.flush().await;
///     assert!(seen.lock().unwrap().is_empty());
///     Ok(())
/// }
/// ```
pub struct EventRelay {
    sink: EventSink,
    shared: Arc<Shared>,
    dispatcher: Option<JoinHandle<()>>,
}

impl EventRelay {
    /// Create a relay with a queue of `capacity` events and spawn its
    /// dispatcher. Must be called within a Tokio runtime.
    ///
    /// The relay starts disarmed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `capacity` is zero or no Tokio runtime is
    /// running.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::config("Event queue capacity must be greater than 0"));
        }
        let runtime = Handle::try_current().map_err(|e| {
            Error::config(format!(
                "Event relay must be created inside a Tokio runtime: {e}"
            ))
        })?;

        let shared = Arc::new(Shared {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            armed: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
        });
        let (tx, rx) = mpsc::channel(capacity);
        let dispatcher = runtime.spawn(Self::dispatch_task(rx, Arc::clone(&shared)));

        debug!("Event relay started with queue capacity {}", capacity);

        Ok(Self {
            sink: EventSink {
                tx,
                shared: Arc::clone(&shared),
            },
            shared,
            dispatcher: Some(dispatcher),
        })
    }

    /// A producer handle for this relay.
    pub fn sink(&self) -> EventSink {
        self.sink.clone()
    }

    /// Register `listener` on the `kind` channel.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&BridgeEvent) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));

        self.shared
            .listeners()
            .entry(kind)
            .or_default()
            .push(Arc::new(ListenerEntry {
                id,
                active: Arc::clone(&active),
                callback: Arc::new(listener),
            }));

        trace!("Listener {} subscribed to {}", id, kind);

        Subscription {
            kind,
            id,
            active,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Unsubscribe every listener on `kind`. Returns how many were removed.
    pub fn remove_all_listeners(&self, kind: EventKind) -> usize {
        let removed = self.shared.listeners().remove(&kind).unwrap_or_default();
        for entry in &removed {
            entry.active.store(false, Ordering::SeqCst);
        }
        removed.len()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.shared.listeners().get(&kind).map_or(0, Vec::len)
    }

    /// Number of emissions lost to a full queue.
    pub fn dropped_events(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub fn is_armed(&self) -> bool {
        self.sink.is_armed()
    }

    /// Wait until every event queued before this call has been dispatched.
    ///
    /// Returns immediately once the relay is shut down.
    pub async fn flush(&self) {
        if self.shared.closed.load(Ordering::SeqCst) {
            return;
        }
        let (done_tx, done_rx) = oneshot::channel();
        if self.sink.tx.send(Envelope::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Stop dispatching. Queued events are discarded and later emissions
    /// are dropped.
    pub fn shutdown(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.sink.disarm();
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.abort();
            debug!("Event relay shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    async fn dispatch_task(mut rx: mpsc::Receiver<Envelope>, shared: Arc<Shared>) {
        while let Some(envelope) = rx.recv().await {
            match envelope {
                Envelope::Event(event) => shared.dispatch(&event),
                Envelope::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
    }
}

impl Drop for EventRelay {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(dispatcher) = self.dispatcher.take() {
            dispatcher.abort();
        }
    }
}

impl std::fmt::Debug for EventRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRelay")
            .field("armed", &self.is_armed())
            .field("closed", &self.is_shut_down())
            .field("dropped", &self.dropped_events())
            .finish_non_exhaustive()
    }
}
