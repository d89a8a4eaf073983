//! Transaction aggregation - rebuilds project views from the spending ledger.
//!
//! Pages are read by walking the ledger's transaction counter backward, so results are
//! always newest first. Soft-deleted records are skipped without back-filling, which means
//! a page can come back shorter than `limit`. Each kept record is joined with its rating
//! summary from the feedback ledger and given a derived utilization rate and status.

use crate::{
    core::units::{format_ether, percent_of},
    errors::{Error, Result},
    ledger::{Ledger, RatingSummary, SpendingRecord},
};
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Utilization at or above which a project counts as completed.
pub const COMPLETED_THRESHOLD: f64 = 90.0;

/// Presentation status derived from utilization.
///
/// Nothing on-chain marks a project as finished; this is a display heuristic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProjectStatus {
    /// Nothing spent yet
    Pending,
    /// Some budget spent, below the completion threshold
    #[serde(rename = "In Progress")]
    InProgress,
    /// At least 90% of the budget spent
    Completed,
}

impl ProjectStatus {
    /// Status for a utilization percentage.
    #[must_use]
    pub fn from_utilization(rate: f64) -> Self {
        if rate >= COMPLETED_THRESHOLD {
            Self::Completed
        } else if rate > 0.0 {
            Self::InProgress
        } else {
            Self::Pending
        }
    }
}

/// An active project transaction with derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingTransaction {
    /// Ledger id
    pub id: u64,
    /// Department short code
    pub department: String,
    /// Project name
    pub project_name: String,
    /// Project category
    pub project_type: String,
    /// Allocated budget as a decimal string
    pub budget_allocated: String,
    /// Amount spent as a decimal string
    pub amount_spent: String,
    /// Free-text location
    pub location: String,
    /// Free-text description
    pub description: String,
    /// Block time at recording
    pub timestamp: DateTime<Utc>,
    /// Address that recorded the transaction
    pub recorded_by: Address,
    /// `amount_spent / budget_allocated * 100`, 0 when the budget is 0
    pub utilization_rate: f64,
    /// Status derived from `utilization_rate`
    pub status: ProjectStatus,
    /// Citizen rating summary
    pub rating: RatingSummary,
    /// Allocated budget in base units
    #[serde(skip)]
    pub budget_wei: U256,
    /// Amount spent in base units
    #[serde(skip)]
    pub spent_wei: U256,
}

impl SpendingTransaction {
    /// Builds the view of an active record joined with its rating.
    #[must_use]
    pub fn from_record(record: SpendingRecord, rating: RatingSummary) -> Self {
        let utilization_rate = percent_of(record.amount_spent, record.budget_allocated);
        Self {
            id: record.id,
            department: record.department,
            project_name: record.project_name,
            project_type: record.project_type,
            budget_allocated: format_ether(record.budget_allocated),
            amount_spent: format_ether(record.amount_spent),
            location: record.location,
            description: record.description,
            timestamp: record.timestamp,
            recorded_by: record.recorded_by,
            utilization_rate,
            status: ProjectStatus::from_utilization(utilization_rate),
            rating,
            budget_wei: record.budget_allocated,
            spent_wei: record.amount_spent,
        }
    }
}

/// Inclusive id window `(end, start)` walked backward for a page, or `None` when empty.
#[must_use]
pub fn page_window(count: u64, limit: u64, offset: u64) -> Option<(u64, u64)> {
    if limit == 0 || offset >= count {
        return None;
    }
    let end = count - offset;
    let start = end.saturating_sub(limit - 1).max(1);
    Some((end, start))
}

/// Rating summary for a transaction, degrading to zero on any lookup failure.
async fn rating_or_default(ledger: &Ledger, transaction_id: u64) -> RatingSummary {
    match ledger.feedback.rating_summary(transaction_id).await {
        Ok(scaled) => RatingSummary::from(scaled),
        Err(e) => {
            warn!("Rating lookup failed for transaction {transaction_id}: {e}");
            RatingSummary::default()
        }
    }
}

/// Lists active transactions newest first.
///
/// Walks ids from `count - offset` down to `max(1, count - offset - limit + 1)`. Inactive
/// records are skipped and not replaced, so the page may be shorter than `limit`.
///
/// # Errors
/// Returns [`Error::ChainUnavailable`] if the counter or any record in the window cannot
/// be read. A failed rating lookup only zeroes that record's rating.
#[instrument(skip(ledger))]
pub async fn list_transactions(
    ledger: &Ledger,
    limit: u64,
    offset: u64,
) -> Result<Vec<SpendingTransaction>> {
    let count = ledger.spending.count().await?;
    let Some((end, start)) = page_window(count, limit, offset) else {
        return Ok(Vec::new());
    };

    let mut transactions = Vec::new();
    for id in (start..=end).rev() {
        let record = ledger
            .spending
            .transaction(id)
            .await
            .inspect_err(|e| warn!("Failed to fetch transaction {id}: {e}"))?;
        if !record.is_active {
            debug!("Skipping inactive transaction {id}");
            continue;
        }
        let rating = rating_or_default(ledger, id).await;
        transactions.push(SpendingTransaction::from_record(record, rating));
    }

    debug!(
        "Listed {} transactions from ids {end}..={start}",
        transactions.len()
    );
    Ok(transactions)
}

/// Every active transaction on the ledger, newest first.
pub async fn all_active_transactions(ledger: &Ledger) -> Result<Vec<SpendingTransaction>> {
    list_transactions(ledger, u64::MAX, 0).await
}

/// Fetches one transaction.
///
/// Returns `Ok(None)` when the record exists but has been soft-deleted.
///
/// # Errors
/// - [`Error::RecordNotFound`] when `id` is outside `1..=count`
/// - [`Error::ChainUnavailable`] when the ledger cannot be read
#[instrument(skip(ledger))]
pub async fn get_transaction(ledger: &Ledger, id: u64) -> Result<Option<SpendingTransaction>> {
    let count = ledger.spending.count().await?;
    if id == 0 || id > count {
        return Err(Error::RecordNotFound {
            kind: "Transaction",
            id,
        });
    }

    let record = ledger.spending.transaction(id).await?;
    if !record.is_active {
        return Ok(None);
    }
    let rating = rating_or_default(ledger, id).await;
    Ok(Some(SpendingTransaction::from_record(record, rating)))
}

/// Optional case-insensitive substring filters applied to a page of transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Matches against the department code
    pub department: Option<String>,
    /// Matches against the project type
    pub project_type: Option<String>,
    /// Matches against the location
    pub location: Option<String>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl TransactionFilter {
    /// Whether a transaction passes every filter that is set.
    #[must_use]
    pub fn matches(&self, tx: &SpendingTransaction) -> bool {
        let passes = |filter: &Option<String>, value: &str| {
            filter
                .as_deref()
                .is_none_or(|needle| contains_ignore_case(value, needle))
        };
        passes(&self.department, &tx.department)
            && passes(&self.project_type, &tx.project_type)
            && passes(&self.location, &tx.location)
    }

    /// Keeps the transactions that pass, preserving order.
    #[must_use]
    pub fn apply(&self, transactions: Vec<SpendingTransaction>) -> Vec<SpendingTransaction> {
        transactions.into_iter().filter(|tx| self.matches(tx)).collect()
    }
}

/// Searches the newest `limit` transactions by project name, department, description
/// or location (case-insensitive).
pub async fn search_transactions(
    ledger: &Ledger,
    query: &str,
    limit: u64,
) -> Result<Vec<SpendingTransaction>> {
    let transactions = list_transactions(ledger, limit, 0).await?;
    Ok(transactions
        .into_iter()
        .filter(|tx| {
            contains_ignore_case(&tx.project_name, query)
                || contains_ignore_case(&tx.department, query)
                || contains_ignore_case(&tx.description, query)
                || contains_ignore_case(&tx.location, query)
        })
        .collect())
}

/// A page of one department's transactions plus the total number that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentPage {
    /// Transactions in this page, newest first
    pub transactions: Vec<SpendingTransaction>,
    /// Number of active transactions for the department
    pub total: usize,
}

/// Active transactions whose department code equals `department` exactly, paged after
/// filtering.
pub async fn department_transactions(
    ledger: &Ledger,
    department: &str,
    limit: usize,
    offset: usize,
) -> Result<DepartmentPage> {
    let matching: Vec<SpendingTransaction> = all_active_transactions(ledger)
        .await?
        .into_iter()
        .filter(|tx| tx.department == department)
        .collect();
    let total = matching.len();
    let transactions = matching.into_iter().skip(offset).take(limit).collect();
    Ok(DepartmentPage {
        transactions,
        total,
    })
}
