use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::dispatcher::{DelayedDispatcher, DispatchOutcome};
use crate::error::AppError;
use crate::types::{
    HealthResponse, LabelQuery, LabelResponse, SendRequest, SendResponse, StatusResponse,
};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub struct AppState {
    pub dispatcher: Arc<DelayedDispatcher>,
    in_flight: AtomicBool,
}

impl AppState {
    pub fn new(dispatcher: DelayedDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            in_flight: AtomicBool::new(false),
        }
    }

    fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Held for the whole dispatch cycle; only one can exist at a time.
struct InFlightGuard {
    state: Arc<AppState>,
}

impl InFlightGuard {
    fn acquire(state: &Arc<AppState>) -> Option<Self> {
        state
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            state: state.clone(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.dispatcher.reset();
        self.state.in_flight.store(false, Ordering::Release);
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/send", post(send_message))
        .route("/api/label", get(label))
        .route("/api/status", get(status))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Text for the send button, derived from the current delay fields. The unit
/// is echoed as given, recognised or not.
pub fn trigger_label(amount: f64, unit: &str) -> String {
    if amount != 0.0 && !amount.is_nan() && !unit.is_empty() {
        format!("Send in {} {}", amount, unit)
    } else {
        "Send".to_string()
    }
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let request = req.validate().map_err(AppError::bad_request)?;

    let guard = InFlightGuard::acquire(&state)
        .ok_or_else(|| AppError::conflict(anyhow::anyhow!("A message is already being sent")))?;

    let cycle_id = Uuid::new_v4().to_string();
    info!(
        "Cycle {}: sending in {} {}",
        cycle_id, request.delay_amount, request.delay_unit
    );

    // Run the cycle on its own task so a dropped connection cannot cancel it.
    let dispatcher = state.dispatcher.clone();
    let outcome = tokio::spawn(async move {
        let _guard = guard;
        dispatcher.dispatch(&request).await
    })
    .await?;

    match &outcome {
        DispatchOutcome::Success => info!("Cycle {} succeeded", cycle_id),
        DispatchOutcome::Failure { reason } => {
            warn!("Cycle {} failed: {}", cycle_id, reason)
        }
    }

    Ok((StatusCode::OK, Json(SendResponse { cycle_id, outcome })))
}

pub async fn label(Query(query): Query<LabelQuery>) -> Json<LabelResponse> {
    Json(LabelResponse {
        label: trigger_label(query.delay_amount, &query.delay_unit),
    })
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        phase: state.dispatcher.phase(),
        in_flight: state.is_in_flight(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
