//! IngestAdapter — the HTTP boundary (spec §4.6, §6).
//!
//! Decodes an incoming packet, calls the selector, and enqueues into the
//! dispatch pipeline. The core's only contract here is that the counters
//! end up accurate; the HTTP response is otherwise best-effort.

use std::sync::Arc;

use axum::extract::{rejection::JsonRejection, DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::config::Tunables;
use crate::counters::{Counters, CountersSnapshot};
use crate::dispatch::DispatchPipeline;
use crate::error::IngestError;
use crate::packet::LogPacket;
use crate::registry::AnalyzerRegistry;
use crate::selector;

/// Shared application state handed to every handler. Cheap to clone — every
/// field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<AnalyzerRegistry>,
    pub counters: Arc<Counters>,
    pub tunables: Arc<Tunables>,
    pub dispatch: Arc<DispatchPipeline>,
}

/// A single packet is a batch of messages, not an unbounded stream — cap the
/// body well above any realistic packet so a misbehaving agent can't pin a
/// worker task on an enormous read.
const MAX_PACKET_BYTES: usize = 16 * 1024 * 1024;

/// Build the router: the canonical distribute path, its historical alias,
/// and the health endpoint (spec §6).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/distribute", post(distribute))
        .route("/api/v1/logs", post(distribute))
        .route("/api/v1/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_PACKET_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn bad_request(err: IngestError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn distribute(
    State(state): State<AppState>,
    body: Result<Json<LogPacket>, JsonRejection>,
) -> Response {
    state.counters.record_received();

    let packet = match body {
        Ok(Json(packet)) => packet,
        Err(rejection) => return bad_request(IngestError::MalformedJson(rejection.body_text())),
    };

    if packet.messages.is_empty() {
        return bad_request(IngestError::EmptyMessages);
    }

    let snapshot = state.registry.snapshot();
    let total = state.counters.total_messages_processed();
    let target = selector::select(
        &snapshot,
        total,
        packet.message_count(),
        state.tunables.deficit_threshold,
    );

    match target {
        Some(index) => {
            state.counters.record_queued();
            state.dispatch.enqueue(packet, index).await;
        }
        None => {
            debug!(packet_id = %packet.packet_id, "no analyzer online — dropping");
            state.counters.record_dropped();
        }
    }

    StatusCode::ACCEPTED.into_response()
}

async fn health(State(state): State<AppState>) -> Json<CountersSnapshot> {
    Json(CountersSnapshot::from(state.counters.as_ref()))
}
