use super::{
    ApiResponse, AppState, LimitParams, Pagination, Submitted, parse_count, parse_id, parse_limit,
};
use crate::{
    core::{
        stats::{SpendingSummary, spending_summary},
        transaction::{
            SpendingTransaction, TransactionFilter, get_transaction, list_transactions,
            search_transactions,
        },
        write::{self, GasEstimate, NewTransaction, WriteRequest},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

const DEFAULT_LIMIT: u64 = 20;
const DEFAULT_SEARCH_LIMIT: u64 = 100;

/// `GET /api/transactions` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    limit: Option<String>,
    offset: Option<String>,
    department: Option<String>,
    project_type: Option<String>,
    location: Option<String>,
}

/// Lists the newest active transactions, optionally filtered.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Vec<SpendingTransaction>>> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT)?;
    let offset = parse_count(params.offset.as_deref(), 0, "offset")?;
    let filter = TransactionFilter {
        department: params.department,
        project_type: params.project_type,
        location: params.location,
    };

    let transactions = filter.apply(list_transactions(&state.ledger, limit, offset).await?);
    let total = transactions.len() as u64;
    Ok(ApiResponse::ok(transactions).with_pagination(Pagination {
        limit,
        offset,
        total,
    }))
}

/// Free-text search over the newest transactions.
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<ApiResponse<Vec<SpendingTransaction>>> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_SEARCH_LIMIT)?;
    let results = search_transactions(&state.ledger, query.trim(), limit).await?;
    let message = format!("Found {} transactions matching '{}'", results.len(), query.trim());
    Ok(ApiResponse::ok(results).with_message(message))
}

/// Headline figures over every active transaction.
pub async fn summary(State(state): State<AppState>) -> Result<ApiResponse<SpendingSummary>> {
    Ok(ApiResponse::ok(spending_summary(&state.ledger).await?))
}

/// One transaction by id. Soft-deleted transactions are reported as not found.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<SpendingTransaction>> {
    let id = parse_id(&id, "transaction")?;
    get_transaction(&state.ledger, id)
        .await?
        .map(ApiResponse::ok)
        .ok_or(Error::RecordNotFound {
            kind: "Transaction",
            id,
        })
}

/// Records a spending transaction through the configured signer.
pub async fn record(
    State(state): State<AppState>,
    Json(input): Json<NewTransaction>,
) -> Result<(StatusCode, ApiResponse<Submitted>)> {
    let transaction_hash = write::record_transaction(state.writer()?, &input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(Submitted { transaction_hash })
            .with_message("Transaction recorded on the ledger"),
    ))
}

/// Prices a write without submitting it.
pub async fn estimate_gas(
    State(state): State<AppState>,
    Json(request): Json<WriteRequest>,
) -> Result<ApiResponse<GasEstimate>> {
    let estimate = write::estimate_gas(state.writer()?, &request, &state.currency).await?;
    Ok(ApiResponse::ok(estimate))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::super::test_support::*;
    use crate::errors::Result;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_with_pagination_and_filter() -> Result<()> {
        let (chain, app) = test_app();
        chain.add_project("MOH", "Clinic", "Healthcare", "Penang", "100", "10")?;
        chain.add_project("MOE", "School", "Education", "Ipoh", "100", "10")?;
        chain.add_project("MOH", "Hospital", "Healthcare", "Ipoh", "100", "10")?;

        let (status, body) = get_json(app.clone(), "/api/transactions?limit=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["id"], 3);
        assert_eq!(body["data"][1]["projectName"], "School");
        assert_eq!(body["pagination"], json!({ "limit": 2, "offset": 0, "total": 2 }));

        let (_, filtered) = get_json(app, "/api/transactions?department=moh&location=ipoh").await;
        assert_eq!(filtered["data"].as_array().unwrap().len(), 1);
        assert_eq!(filtered["data"][0]["status"], "In Progress");
        Ok(())
    }

    #[tokio::test]
    async fn test_list_rejects_bad_limit() {
        let (_chain, app) = test_app();
        let (status, body) = get_json(app, "/api/transactions?limit=lots").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_list_chain_down_is_503() {
        let (chain, app) = test_app();
        chain.set_offline(true);
        let (status, body) = get_json(app, "/api/transactions").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body["error"].as_str().unwrap().contains("Chain unavailable"));
    }

    #[tokio::test]
    async fn test_get_one() -> Result<()> {
        let (chain, app) = test_app();
        chain.add_transaction("MOT", "10", "5")?;
        chain.add_transaction("MOT", "10", "5")?;
        chain.deactivate_transaction(2);

        let (status, body) = get_json(app.clone(), "/api/transactions/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["budgetAllocated"], "10.0");
        assert_eq!(body["data"]["utilizationRate"], 50.0);

        let (inactive, _) = get_json(app.clone(), "/api/transactions/2").await;
        assert_eq!(inactive, StatusCode::NOT_FOUND);
        let (missing, _) = get_json(app.clone(), "/api/transactions/9").await;
        assert_eq!(missing, StatusCode::NOT_FOUND);
        let (invalid, _) = get_json(app, "/api/transactions/abc").await;
        assert_eq!(invalid, StatusCode::BAD_REQUEST);
        Ok(())
    }

    #[tokio::test]
    async fn test_search_and_summary() -> Result<()> {
        let (chain, app) = test_app();
        chain.add_project("MOH", "Clinic", "Healthcare", "Penang", "100", "10")?;
        chain.add_project("MOE", "School", "Education", "Ipoh", "100", "30")?;

        let (_, found) = get_json(app.clone(), "/api/transactions/search/clinic").await;
        assert_eq!(found["data"].as_array().unwrap().len(), 1);
        assert_eq!(found["message"], "Found 1 transactions matching 'clinic'");

        let (status, summary) = get_json(app, "/api/transactions/stats/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["data"]["totalProjects"], 2);
        assert_eq!(summary["data"]["totalSpent"], "40.0");
        Ok(())
    }

    #[tokio::test]
    async fn test_search_default_limit_is_one_hundred() -> Result<()> {
        let (chain, app) = test_app();
        for _ in 0..120 {
            chain.add_project("MOH", "Clinic", "Healthcare", "Penang", "100", "10")?;
        }

        let (_, found) = get_json(app, "/api/transactions/search/clinic").await;
        let results = found["data"].as_array().unwrap();
        assert_eq!(results.len(), 100);
        assert_eq!(results[0]["id"], 120);
        Ok(())
    }

    #[tokio::test]
    async fn test_record_transaction() {
        let (chain, app) = test_app();
        let payload = json!({
            "department": "MOH",
            "projectName": "Rural Clinic",
            "projectType": "Healthcare",
            "budgetAllocated": "250",
            "amountSpent": "20",
            "location": "Sabah"
        });

        let (status, body) = post_json(app, "/api/admin/transaction", &payload).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["data"]["transactionHash"].as_str().unwrap().starts_with("0x"));
        assert_eq!(chain.write_calls(), 1);
    }

    #[tokio::test]
    async fn test_record_transaction_overspend_is_400() {
        let (chain, app) = test_app();
        let payload = json!({
            "department": "MOH",
            "projectName": "Rural Clinic",
            "projectType": "Healthcare",
            "budgetAllocated": "10",
            "amountSpent": "20",
            "location": "Sabah"
        });

        let (status, _) = post_json(app, "/api/admin/transaction", &payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(chain.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_record_transaction_rejected_is_422() {
        let (chain, app) = test_app();
        chain.reject_writes(true);
        let payload = json!({
            "department": "MOH",
            "projectName": "Rural Clinic",
            "projectType": "Healthcare",
            "budgetAllocated": "10",
            "location": "Sabah"
        });

        let (status, body) = post_json(app, "/api/admin/transaction", &payload).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("execution reverted"));
    }

    #[tokio::test]
    async fn test_estimate_gas() {
        let (_chain, app) = test_app();
        let payload = json!({
            "method": "submitFeedback",
            "args": { "transactionId": 1, "comment": "Looks good", "rating": 4 }
        });

        let (status, body) = post_json(app, "/api/admin/estimate-gas", &payload).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["gasLimit"], 150_000);
        assert_eq!(body["data"]["gasPriceGwei"], "2.0");
        assert_eq!(body["data"]["totalCost"], "0.0003");
    }
}
