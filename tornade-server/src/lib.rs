//! HTTP API for Tornade license activation.
//!
//! Routes:
//! - `POST /api/activate` with `{ "key": "...", "deviceId": "..." }` → `{ "token": "..." }`
//! - `GET /api/health` → `{ "status": "ok" }`
//!
//! Errors are returned as `{ "error": "<code>" }`:
//! `invalid_request` (400), `invalid_key` (422), `max_activations_reached` (429),
//! `store_unavailable` (503).

pub mod sqlite;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tornade_license::{ActivationLedger, LicenseError};
use tracing::{debug, error};

pub use sqlite::SqliteActivationStore;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<ActivationLedger>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivateRequest {
    pub key: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ActivateResponse {
    pub token: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler errors, rendered as `{ "error": "<code>" }`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body was not JSON or lacked string `key` / `deviceId` fields.
    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error(transparent)]
    License(#[from] LicenseError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MalformedBody(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::License(err) => {
                let status = match err {
                    LicenseError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    LicenseError::InvalidKey => StatusCode::UNPROCESSABLE_ENTITY,
                    LicenseError::MaxActivationsReached(_) => StatusCode::TOO_MANY_REQUESTS,
                    LicenseError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    LicenseError::Config(_) | LicenseError::Serialization(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.kind())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            error!("Activation request failed: {}", self);
        } else {
            debug!("Activation request rejected: {}", self);
        }
        let body = ErrorResponse {
            error: code.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn activate_handler(
    State(state): State<AppState>,
    payload: Result<Json<ActivateRequest>, JsonRejection>,
) -> Result<Json<ActivateResponse>, ApiError> {
    let Json(request) = payload?;
    let token = state
        .ledger
        .activate(&request.key, &request.device_id)
        .await?;
    Ok(Json(ActivateResponse {
        token: token.as_str().to_string(),
    }))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Build the HTTP API router over the given ledger.
pub fn build_router(ledger: Arc<ActivationLedger>) -> Router {
    Router::new()
        .route("/api/activate", post(activate_handler))
        .route("/api/health", get(health_handler))
        .with_state(AppState { ledger })
}
