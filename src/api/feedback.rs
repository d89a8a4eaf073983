use super::{ApiResponse, AppState, LimitParams, Submitted, parse_id, parse_limit};
use crate::{
    core::{
        feedback::{
            Feedback, FeedbackWithProject, all_feedbacks, transaction_feedbacks, transaction_rating,
        },
        write::{self, NewFeedback},
    },
    errors::Result,
    ledger::RatingSummary,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

const DEFAULT_LIMIT: u64 = 50;

/// Submits citizen feedback through the configured signer.
pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<NewFeedback>,
) -> Result<(StatusCode, ApiResponse<Submitted>)> {
    let transaction_hash = write::submit_feedback(state.writer()?, &input).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(Submitted { transaction_hash }).with_message("Feedback submitted"),
    ))
}

/// Active feedback for one transaction, newest first.
pub async fn for_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<Vec<Feedback>>> {
    let id = parse_id(&id, "transaction")?;
    Ok(ApiResponse::ok(transaction_feedbacks(&state.ledger, id).await?))
}

/// Rating summary for one transaction.
pub async fn rating(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ApiResponse<RatingSummary>> {
    let id = parse_id(&id, "transaction")?;
    Ok(ApiResponse::ok(transaction_rating(&state.ledger, id).await?))
}

/// Newest feedback across all projects.
pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<ApiResponse<Vec<FeedbackWithProject>>> {
    let limit = parse_limit(params.limit.as_deref(), DEFAULT_LIMIT)?;
    Ok(ApiResponse::ok(all_feedbacks(&state.ledger, limit).await?))
}
