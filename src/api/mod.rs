//! HTTP API - axum routes over the aggregation layer.
//!
//! Every response uses the `{ success, data, error?, message?, pagination? }` envelope.
//! Handlers are thin: they parse ids and query parameters, call into [`crate::core`] and
//! map [`Error`] onto a status code.

/// Department analytics and per-department listings
pub mod departments;
/// Citizen feedback reads and submission
pub mod feedback;
/// Overall stats, health and admin dashboard
pub mod stats;
/// Transaction listing, search and lookup
pub mod transactions;

use crate::{
    config::departments::DepartmentCatalog,
    core::{monitor::RefreshMonitor, units::CurrencyConverter},
    errors::{Error, Result},
    ledger::{Ledger, LedgerWriter},
};
use alloy::primitives::TxHash;
use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// Largest page any list endpoint will return.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Read access to both contracts
    pub ledger: Ledger,
    /// Write access, present only when a signer is configured
    pub writer: Option<Arc<dyn LedgerWriter>>,
    /// Department display names
    pub catalog: Arc<DepartmentCatalog>,
    /// Display currency
    pub currency: Arc<CurrencyConverter>,
    /// Network label from the configuration
    pub network: String,
    /// Background refresher, read by the health endpoint
    pub monitor: Arc<RefreshMonitor>,
}

impl AppState {
    /// The configured writer, or a configuration error when the service is read-only.
    pub fn writer(&self) -> Result<&dyn LedgerWriter> {
        self.writer.as_deref().ok_or_else(|| Error::Config {
            message: "write path disabled: PRIVATE_KEY not set".to_string(),
        })
    }
}

/// Paging information echoed back to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Requested page size
    pub limit: u64,
    /// Requested offset
    pub offset: u64,
    /// Items returned, or total matches where the endpoint knows it
    pub total: u64,
}

/// `limit` query string.
#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    /// Requested page size
    pub limit: Option<String>,
}

/// Hash of a write that made it into a block.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    /// Transaction hash
    pub transaction_hash: TxHash,
}

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
        }
    }

    /// Adds a human readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds paging information.
    #[must_use]
    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl ApiResponse<()> {
    /// Failed response carrying an error message.
    #[must_use]
    pub const fn failure(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            message: None,
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Parse { .. } => StatusCode::BAD_REQUEST,
            Self::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            Self::TransactionRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::ChainUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config { .. } | Self::Io(_) | Self::EnvVar(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed with {status}: {self}");
        } else {
            debug!("Request rejected with {status}: {self}");
        }
        (status, ApiResponse::failure(self.to_string())).into_response()
    }
}

/// Parses a positive record id from a path segment.
pub fn parse_id(raw: &str, what: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::validation(format!("invalid {what} id '{raw}'")))
}

/// Parses an optional non-negative query parameter, falling back to `default`.
pub fn parse_count(raw: Option<&str>, default: u64, name: &str) -> Result<u64> {
    raw.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|_| Error::validation(format!("{name} must be a non-negative integer, got '{value}'")))
    })
}

/// Parses a `limit` parameter and caps it at [`MAX_PAGE_SIZE`].
pub fn parse_limit(raw: Option<&str>, default: u64) -> Result<u64> {
    Ok(parse_count(raw, default, "limit")?.min(MAX_PAGE_SIZE))
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(stats::health))
        .route("/api/stats", get(stats::overall))
        .route("/api/transactions", get(transactions::list))
        .route("/api/transactions/search/{query}", get(transactions::search))
        .route("/api/transactions/stats/summary", get(transactions::summary))
        .route("/api/transactions/{id}", get(transactions::get_one))
        .route("/api/departments", get(departments::analytics))
        .route("/api/departments/{id}/spending", get(departments::spending))
        .route("/api/departments/{id}/transactions", get(departments::transactions))
        .route("/api/feedback", get(feedback::list_all).post(feedback::submit))
        .route("/api/feedback/transaction/{id}", get(feedback::for_transaction))
        .route("/api/feedback/rating/{id}", get(feedback::rating))
        .route("/api/admin/transaction", post(transactions::record))
        .route("/api/admin/estimate-gas", post(transactions::estimate_gas))
        .route("/api/admin/dashboard", get(stats::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `bind` and serves until Ctrl-C.
pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutdown signal received");
}
