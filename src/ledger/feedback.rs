//! Feedback ledger records and rating summaries.
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A citizen feedback entry as stored by the feedback contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    /// Sequential id assigned by the contract
    pub id: u64,
    /// Transaction this feedback refers to
    pub transaction_id: u64,
    /// Address of the submitter
    pub citizen: Address,
    /// Free-text comment
    pub comment: String,
    /// Rating, 1 to 5
    pub rating: u8,
    /// Creation time
    pub timestamp: DateTime<Utc>,
    /// Soft-delete flag
    pub is_active: bool,
}

/// Validated arguments for `submitFeedback`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackSubmission {
    /// Transaction being rated
    pub transaction_id: u64,
    /// Comment, at most 500 characters
    pub comment: String,
    /// Rating, 1 to 5
    pub rating: u8,
}

/// Rating summary as the contract reports it: the average is multiplied by 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaledRating {
    /// Average rating times 100 (e.g. 450 for 4.5)
    pub average_x100: u64,
    /// Number of active feedback entries
    pub total: u64,
}

/// Average rating and number of ratings for one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct RatingSummary {
    /// Mean rating, 0 when there are no ratings
    pub average: f64,
    /// Number of ratings
    pub total: u64,
}

impl From<ScaledRating> for RatingSummary {
    #[allow(clippy::cast_precision_loss)]
    fn from(scaled: ScaledRating) -> Self {
        Self {
            average: scaled.average_x100 as f64 / 100.0,
            total: scaled.total,
        }
    }
}
