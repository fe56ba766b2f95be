//! Broadcaster port: live fan-out of state changes.

use irrihub_domain::event::BroadcastEvent;

/// Best-effort, at-most-once delivery of events to live listeners.
///
/// Broadcasting never fails and never waits for listeners.
pub trait Broadcaster {
    fn broadcast(&self, event: BroadcastEvent);
}

impl<T: Broadcaster> Broadcaster for std::sync::Arc<T> {
    fn broadcast(&self, event: BroadcastEvent) {
        (**self).broadcast(event);
    }
}
