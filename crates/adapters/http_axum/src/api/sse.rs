//! Server-Sent Events (SSE) stream for real-time updates.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use serde::Serialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use irrihub_app::ports::HistoryLog;
use irrihub_app::state::Configuration;
use irrihub_app::store::DeviceSnapshot;
use irrihub_domain::event::{BroadcastEvent, EventKind};
use irrihub_domain::time::now_millis;

use crate::error::ApiError;
use crate::state::AppState;

/// Payload of the `hello` frame: configuration plus the latest device states.
#[derive(Serialize)]
struct Hello<'a> {
    #[serde(flatten)]
    configuration: &'a Configuration,
    #[serde(flatten)]
    snapshot: &'a DeviceSnapshot,
}

/// `GET /api/events/stream`: SSE stream of broadcast events.
///
/// The first frame is a `hello` event carrying the current configuration and
/// the latest sensor and valve states, followed by every event broadcast after the subscription. Each frame's
/// `data:` is the JSON-encoded `{kind, ts, data}` event. The stream continues
/// until the client disconnects.
pub async fn stream<H>(
    State(state): State<AppState<H>>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, ApiError>
where
    H: HistoryLog + Send + Sync + 'static,
{
    // subscribe before reading the overview so no change slips in between
    let receiver = state.event_bus.subscribe();
    let overview = state.controller.overview().await?;
    let snapshot = state.controller.latest().await?;
    let hello = BroadcastEvent::new(
        EventKind::Hello,
        now_millis(),
        Hello {
            configuration: &overview.configuration,
            snapshot: &snapshot,
        },
    );

    let live = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => Some(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "SSE subscriber lagged, some events were dropped");
            None
        }
    });
    let frames = tokio_stream::once(hello)
        .chain(live)
        .filter_map(|event| match Event::default().json_data(&event) {
            Ok(frame) => Some(Ok(frame)),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize event for SSE stream");
                None
            }
        });

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}
