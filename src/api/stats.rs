use super::{ApiResponse, AppState};
use crate::{
    core::stats::{AdminDashboard, OverallStats, admin_dashboard, is_connected, overall_stats},
    errors::Result,
};
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Liveness report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Always `"ok"` when the process answers
    pub status: &'static str,
    /// Configured network label
    pub network: String,
    /// Whether the node answered a chain id query
    pub connected: bool,
    /// Whether a signer is configured
    pub write_enabled: bool,
    /// When the background refresh last succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh: Option<DateTime<Utc>>,
    /// Crate version
    pub version: &'static str,
}

/// Process and ledger connection status. Always 200, even when the node is down.
pub async fn health(State(state): State<AppState>) -> ApiResponse<Health> {
    let connected = is_connected(&state.ledger).await;
    let last_refresh = state.monitor.latest().await.map(|s| s.refreshed_at);
    ApiResponse::ok(Health {
        status: "ok",
        network: state.network.clone(),
        connected,
        write_enabled: state.writer.is_some(),
        last_refresh,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Ledger-wide totals.
pub async fn overall(State(state): State<AppState>) -> Result<ApiResponse<OverallStats>> {
    Ok(ApiResponse::ok(overall_stats(&state.ledger).await?))
}

/// Admin dashboard payload.
pub async fn dashboard(State(state): State<AppState>) -> Result<ApiResponse<AdminDashboard>> {
    let dashboard = admin_dashboard(&state.ledger, &state.catalog, &state.currency).await?;
    Ok(ApiResponse::ok(dashboard))
}
