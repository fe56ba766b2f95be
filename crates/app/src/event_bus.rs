//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use irrihub_domain::event::BroadcastEvent;

use crate::ports::Broadcaster;

/// In-process fan-out of [`BroadcastEvent`]s using a tokio [`broadcast`]
/// channel.
///
/// Broadcasting succeeds even when there are no listeners (the event is
/// simply dropped); a listener that falls behind loses the oldest events.
pub struct InProcessEventBus {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events broadcast *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Broadcaster for InProcessEventBus {
    fn broadcast(&self, event: BroadcastEvent) {
        // send only fails when nobody listens
        let _ = self.sender.send(event);
    }
}
