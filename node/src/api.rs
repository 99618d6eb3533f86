//! # HTTP API
//!
//! Builds the axum router for the node's public interface. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Liveness probe                           |
//! | GET    | `/status`         | Node status summary                      |
//! | PUT    | `/signatures`     | Register a second signature              |
//! | GET    | `/signatures/fee` | Fee charged for a signature registration |
//!
//! Enrollment outcomes are reported in-band: `PUT /signatures` answers 200
//! with `success: false` and a message for every refusal, including a body
//! that fails to parse.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use keystone_protocol::enrollment::{EnrollmentRequest, MultisigEnrollment};
use keystone_protocol::network::Mempool;
use keystone_protocol::transaction::Transaction;

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// Enrollment workflow, already wired to its sequence and admission.
    pub enrollment: MultisigEnrollment,
    /// Pool the enrollment workflow admits into. Read here for status.
    pub mempool: Arc<Mempool>,
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/signatures", put(add_signature_handler))
        .route("/signatures/fee", get(fee_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Response payload for `PUT /signatures`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SignatureResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignatureResponse {
    fn ok(transaction: Transaction) -> Self {
        Self {
            success: true,
            transaction: Some(transaction),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction: None,
            error: Some(message.into()),
        }
    }
}

/// Response payload for `GET /signatures/fee`.
#[derive(Debug, Serialize, Deserialize)]
pub struct FeeResponse {
    pub success: bool,
    pub fee: u64,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Node software version.
    pub version: String,
    /// Transactions waiting in the pool.
    pub pending_transactions: usize,
    /// Accounts known to the node.
    pub accounts: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: 200 while the process is serving.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        version: state.version.clone(),
        pending_transactions: state.mempool.size(),
        accounts: state.mempool.accounts().len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `PUT /signatures`: enroll a second signature for the caller's account,
/// or for a multisignature group the caller belongs to.
async fn add_signature_handler(
    State(state): State<AppState>,
    body: Result<Json<EnrollmentRequest>, JsonRejection>,
) -> Json<SignatureResponse> {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state.metrics.record_failure("invalid_input");
            return Json(SignatureResponse::err(rejection.body_text()));
        }
    };

    let started = Instant::now();
    let outcome = state.enrollment.enroll(request).await;
    state
        .metrics
        .enrollment_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    state
        .metrics
        .transactions_in_pool
        .set(state.mempool.size() as i64);

    match outcome {
        Ok(transaction) => {
            state.metrics.enrollments_total.inc();
            Json(SignatureResponse::ok(transaction))
        }
        Err(e) => {
            tracing::debug!(reason = e.kind(), error = %e, "enrollment refused");
            state.metrics.record_failure(e.kind());
            Json(SignatureResponse::err(e.to_string()))
        }
    }
}

/// `GET /signatures/fee`
async fn fee_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(FeeResponse {
        success: true,
        fee: state.enrollment.fee(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
