//! HTTP surface of the message protocol between the engine and the
//! presentation layer (floating counter, intervention dialog, extractor).
//! Inbound requests land here; outbound action-tagged messages are consumed
//! either in-process via `EngineHandle::subscribe` or over the long-poll
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::engine::{CategoryCount, EngineHandle, EngineMessage};
use crate::intervention::InterventionChoice;
use crate::session::SessionSnapshot;
use crate::settings::Settings;
use crate::stimulus::{Coalescer, MUTATION_SETTLE, SCROLL_QUIET};
use crate::thresholds::EvaluatorState;

/// Longest a message long-poll waits before returning empty.
const LONG_POLL_WINDOW: Duration = Duration::from_secs(25);

#[derive(Clone)]
pub struct AppState {
    handle: EngineHandle,
    scroll_coalescer: Coalescer,
    mutation_coalescer: Coalescer,
    /// One subscription held for the lifetime of the router, so messages
    /// emitted between two polls sit in the broadcast buffer instead of
    /// vanishing. The protocol has a single presentation client.
    outbound: Arc<Mutex<broadcast::Receiver<EngineMessage>>>,
}

pub fn create_router(handle: EngineHandle) -> Router {
    let state = AppState {
        scroll_coalescer: Coalescer::spawn(SCROLL_QUIET, handle.clone()),
        mutation_coalescer: Coalescer::spawn(MUTATION_SETTLE, handle.clone()),
        outbound: Arc::new(Mutex::new(handle.subscribe())),
        handle,
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/observe", post(observe))
        .route("/scroll", post(scroll))
        .route("/counts", get(counts))
        .route("/check-reminder", post(check_reminder))
        .route("/session-metrics", get(session_metrics))
        .route("/intervention/choice", post(intervention_choice))
        .route("/messages/poll", get(poll_messages))
        .route("/admin/reload-settings", get(reload_settings))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct ObserveResp {
    registered: usize,
}

async fn observe(
    State(state): State<AppState>,
    Json(items): Json<Vec<crate::content::RawItem>>,
) -> Json<ObserveResp> {
    let registered = state.handle.observe(&items);
    state.mutation_coalescer.signal();
    Json(ObserveResp { registered })
}

#[derive(Deserialize)]
struct ScrollReq {
    delta: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrollResp {
    scroll_depth: f64,
}

async fn scroll(State(state): State<AppState>, Json(body): Json<ScrollReq>) -> Json<ScrollResp> {
    let scroll_depth = state.handle.scroll(body.delta);
    state.scroll_coalescer.signal();
    Json(ScrollResp { scroll_depth })
}

#[derive(Serialize)]
struct CountsResp {
    categories: Vec<CategoryCount>,
}

async fn counts(State(state): State<AppState>) -> Json<CountsResp> {
    Json(CountsResp {
        categories: state.handle.counts(),
    })
}

#[derive(Serialize)]
struct EvaluationResp {
    state: EvaluatorState,
}

async fn check_reminder(State(state): State<AppState>) -> Json<EvaluationResp> {
    Json(EvaluationResp {
        state: state.handle.check_reminder(),
    })
}

async fn session_metrics(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.handle.session_metrics())
}

#[derive(Deserialize)]
struct ChoiceReq {
    choice: InterventionChoice,
}

async fn intervention_choice(
    State(state): State<AppState>,
    Json(body): Json<ChoiceReq>,
) -> Json<EvaluationResp> {
    state.handle.choose(body.choice);
    Json(EvaluationResp {
        state: state.handle.state(),
    })
}

/// Long-poll for outbound messages. Waits up to the window for the first
/// one, then drains everything already buffered; an empty array means the
/// window closed quietly. A lagged receiver skips to the oldest retained
/// message rather than erroring.
async fn poll_messages(State(state): State<AppState>) -> Json<Vec<EngineMessage>> {
    let mut rx = state.outbound.lock().await;
    let mut batch = Vec::new();

    match tokio::time::timeout(LONG_POLL_WINDOW, recv_skipping_lag(&mut rx)).await {
        Ok(Some(first)) => batch.push(first),
        Ok(None) | Err(_) => return Json(batch),
    }
    loop {
        match rx.try_recv() {
            Ok(msg) => batch.push(msg),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    Json(batch)
}

async fn recv_skipping_lag(
    rx: &mut broadcast::Receiver<EngineMessage>,
) -> Option<EngineMessage> {
    loop {
        match rx.recv().await {
            Ok(msg) => return Some(msg),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => return None,
        }
    }
}

async fn reload_settings(State(state): State<AppState>) -> &'static str {
    state.handle.reload_settings(Settings::load());
    "reloaded"
}
