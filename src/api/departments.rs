use super::{ApiResponse, AppState, Pagination, parse_count, parse_limit};
use crate::{
    core::{
        department::{DepartmentAnalytics, DepartmentSpending, department_analytics, department_spending},
        transaction::{SpendingTransaction, department_transactions},
    },
    errors::{Error, Result},
};
use axum::extract::{Path, Query, State};
use serde::Deserialize;

const DEFAULT_LIMIT: u64 = 20;

/// `limit` / `offset` query string.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    limit: Option<String>,
    offset: Option<String>,
}

fn department_code(raw: &str) -> Result<String> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(Error::validation("department id is required"));
    }
    Ok(code.to_string())
}

/// Every department's rollup, largest budget first.
pub async fn analytics(State(state): State<AppState>) -> Result<ApiResponse<Vec<DepartmentAnalytics>>> {
    Ok(ApiResponse::ok(
        department_analytics(&state.ledger, &state.catalog).await?,
    ))
}

/// Ledger totals for one department.
pub async fn spending(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<DepartmentSpending>> {
    let code = department_code(&id)?;
    Ok(ApiResponse::ok(department_spending(&state.ledger, &code).await?))
}

/// One department's active transactions, newest first.
pub async fn transactions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<ApiResponse<Vec<SpendingTransaction>>> {
    let code = department_code(&id)?;
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT)?;
    let offset = parse_count(params.offset.as_deref(), 0, "offset")?;

    let page = department_transactions(
        &state.ledger,
        &code,
        usize::try_from(limit).unwrap_or(usize::MAX),
        usize::try_from(offset).unwrap_or(usize::MAX),
    )
    .await?;
    Ok(ApiResponse::ok(page.transactions).with_pagination(Pagination {
        limit,
        offset,
        total: page.total as u64,
    }))
}
