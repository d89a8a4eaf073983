//! Feedback reads - citizen comments and ratings per transaction.

use crate::{
    core::transaction,
    errors::Result,
    ledger::{FeedbackRecord, Ledger, RatingSummary},
};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};

const UNKNOWN_PROJECT: &str = "Unknown Project";
const UNKNOWN_DEPARTMENT: &str = "Unknown Department";

/// An active feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    /// Ledger id
    pub id: u64,
    /// Transaction the feedback refers to
    pub transaction_id: u64,
    /// Submitter address
    pub citizen: Address,
    /// Comment text
    pub comment: String,
    /// Rating, 1 to 5
    pub rating: u8,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl From<FeedbackRecord> for Feedback {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            id: record.id,
            transaction_id: record.transaction_id,
            citizen: record.citizen,
            comment: record.comment,
            rating: record.rating,
            timestamp: record.timestamp,
        }
    }
}

/// Feedback joined with the project it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackWithProject {
    /// The feedback itself
    #[serde(flatten)]
    pub feedback: Feedback,
    /// Project name, or `"Unknown Project"`
    pub project_name: String,
    /// Department code, or `"Unknown Department"`
    pub department: String,
}

/// Rating summary for a transaction. Unlike the aggregated listings, a failed lookup
/// here is an error.
pub async fn transaction_rating(ledger: &Ledger, transaction_id: u64) -> Result<RatingSummary> {
    Ok(ledger.feedback.rating_summary(transaction_id).await?.into())
}

/// Active feedback for one transaction, newest first.
///
/// Entries that fail to load are logged and skipped.
#[instrument(skip(ledger))]
pub async fn transaction_feedbacks(ledger: &Ledger, transaction_id: u64) -> Result<Vec<Feedback>> {
    let ids = ledger
        .feedback
        .feedback_ids_for_transaction(transaction_id)
        .await?;

    let mut feedbacks = Vec::with_capacity(ids.len());
    for id in ids {
        match ledger.feedback.feedback(id).await {
            Ok(record) if record.is_active => feedbacks.push(Feedback::from(record)),
            Ok(_) => {}
            Err(e) => warn!("Failed to fetch feedback {id}: {e}"),
        }
    }

    feedbacks.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
    Ok(feedbacks)
}

/// The newest `limit` feedback entries across all projects, for admin review.
///
/// Each entry is joined with its project; when the project cannot be loaded the
/// placeholders `"Unknown Project"` / `"Unknown Department"` are used.
#[instrument(skip(ledger))]
pub async fn all_feedbacks(ledger: &Ledger, limit: u64) -> Result<Vec<FeedbackWithProject>> {
    let count = ledger.feedback.count().await?;
    let Some((end, start)) = transaction::page_window(count, limit, 0) else {
        return Ok(Vec::new());
    };

    let mut feedbacks = Vec::new();
    for id in (start..=end).rev() {
        let record = match ledger.feedback.feedback(id).await {
            Ok(record) if record.is_active => record,
            Ok(_) => continue,
            Err(e) => {
                warn!("Failed to fetch feedback {id}: {e}");
                continue;
            }
        };

        let project = match transaction::get_transaction(ledger, record.transaction_id).await {
            Ok(project) => project,
            Err(e) => {
                warn!(
                    "Could not load transaction {} for feedback {id}: {e}",
                    record.transaction_id
                );
                None
            }
        };
        let (project_name, department) = project.map_or_else(
            || (UNKNOWN_PROJECT.to_string(), UNKNOWN_DEPARTMENT.to_string()),
            |tx| (tx.project_name, tx.department),
        );

        feedbacks.push(FeedbackWithProject {
            feedback: Feedback::from(record),
            project_name,
            department,
        });
    }

    feedbacks.sort_by(|a, b| {
        b.feedback
            .timestamp
            .cmp(&a.feedback.timestamp)
            .then(b.feedback.id.cmp(&a.feedback.id))
    });
    Ok(feedbacks)
}
