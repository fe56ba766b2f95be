//! Shared application state for axum handlers.

use std::sync::Arc;

use irrihub_app::controller::ControllerHandle;
use irrihub_app::event_bus::InProcessEventBus;
use irrihub_app::ports::HistoryLog;

/// Application state shared across all axum handlers.
///
/// Generic over the history log to avoid dynamic dispatch. `Clone` is
/// implemented manually so `H` itself does not need to be `Clone`.
pub struct AppState<H> {
    /// Handle to the controller owning the irrigation state.
    pub controller: ControllerHandle,
    /// Live event fan-out, subscribed to by the SSE stream.
    pub event_bus: Arc<InProcessEventBus>,
    /// History log for time-series queries.
    pub history: Arc<H>,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            event_bus: Arc::clone(&self.event_bus),
            history: Arc::clone(&self.history),
        }
    }
}

impl<H> AppState<H>
where
    H: HistoryLog + Send + Sync + 'static,
{
    pub fn new(
        controller: ControllerHandle,
        event_bus: Arc<InProcessEventBus>,
        history: Arc<H>,
    ) -> Self {
        Self {
            controller,
            event_bus,
            history,
        }
    }
}
