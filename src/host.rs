//! The narrow interface between the panel core and the hosting editor.
//!
//! The core never polls the editor: it asks the host to open a file as an
//! editing surface, subscribes to surface-closed notifications, and reads a
//! closing surface's buffer before the host discards it. Everything else
//! about the editor (tabs, documents, rendering) stays on the host's side
//! of this seam.

use color_eyre::eyre::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Opaque identifier for an editing surface, issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Handle returned by `subscribe_closed`, consumed by `unsubscribe_closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Receiver of surface-closed notifications. Fires for *every* surface the
/// host closes; observers filter by identifier themselves.
pub trait SurfaceObserver: Send + Sync {
    fn surface_closed(&self, id: SurfaceId, host: &dyn EditorHost);
}

pub trait EditorHost: Send + Sync {
    /// Open `path` as a new editing surface and return its identifier.
    fn open_surface(&self, path: &Path) -> Result<SurfaceId>;

    /// The surface's in-memory buffer. For a closing surface this is only
    /// valid during the closed notification, before the host discards it.
    fn surface_text(&self, id: SurfaceId) -> Result<String>;

    fn subscribe_closed(&self, observer: Arc<dyn SurfaceObserver>) -> SubscriptionId;

    fn unsubscribe_closed(&self, subscription: SubscriptionId);
}

/// Subscriber bookkeeping a host implementation can embed: hands out
/// subscription handles and fans closed notifications out to every live
/// observer.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: AtomicU64,
    observers: Mutex<HashMap<SubscriptionId, Arc<dyn SurfaceObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Arc<dyn SurfaceObserver>>> {
        self.observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, observer: Arc<dyn SurfaceObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers().insert(id, observer);
        id
    }

    pub fn unsubscribe(&self, subscription: SubscriptionId) {
        self.observers().remove(&subscription);
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers().len()
    }

    /// Deliver a closed notification to every observer subscribed at this
    /// moment. Observers are snapshotted first so one may unsubscribe
    /// (itself included) during delivery without deadlocking the registry.
    pub fn notify_closed(&self, id: SurfaceId, host: &dyn EditorHost) {
        let observers: Vec<Arc<dyn SurfaceObserver>> =
            self.observers().values().cloned().collect();
        for observer in observers {
            observer.surface_closed(id, host);
        }
    }
}
