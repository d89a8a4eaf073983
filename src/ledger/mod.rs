//! Ledger layer - typed views of the two on-chain contracts.
//!
//! The spending ledger stores project transactions, the feedback ledger stores citizen
//! ratings. Both are exposed as capability traits so the aggregation code in [`crate::core`]
//! never touches RPC types directly. [`rpc`] holds the alloy-backed implementation; tests
//! use an in-memory chain.

/// Feedback ledger record types
pub mod feedback;
/// alloy contract bindings and the RPC-backed ledger adapter
pub mod rpc;
/// Spending ledger record types
pub mod spending;

pub use feedback::{FeedbackRecord, FeedbackSubmission, RatingSummary, ScaledRating};
pub use spending::{DepartmentTotals, SpendingRecord, SpendingSubmission};

use crate::errors::{Error, Result};
use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Read-only view of the government spending contract.
///
/// Every method is side-effect free and may be retried. RPC failures surface as
/// [`Error::ChainUnavailable`].
#[async_trait]
pub trait SpendingLedger: Send + Sync {
    /// Monotonic transaction counter, soft-deleted records included.
    async fn count(&self) -> Result<u64>;
    /// Fetches a transaction record by id.
    async fn transaction(&self, id: u64) -> Result<SpendingRecord>;
    /// All department ids known to the contract.
    async fn department_ids(&self) -> Result<Vec<String>>;
    /// Aggregated `(budget, spent)` for one department.
    async fn department_totals(&self, department: &str) -> Result<DepartmentTotals>;
    /// Chain id reported by the node, used as a liveness probe.
    async fn chain_id(&self) -> Result<u64>;
}

/// Read-only view of the citizen feedback contract.
#[async_trait]
pub trait FeedbackLedger: Send + Sync {
    /// Monotonic feedback counter.
    async fn count(&self) -> Result<u64>;
    /// Ids of every feedback recorded against a transaction.
    async fn feedback_ids_for_transaction(&self, transaction_id: u64) -> Result<Vec<u64>>;
    /// Fetches a feedback record by id.
    async fn feedback(&self, id: u64) -> Result<FeedbackRecord>;
    /// Average rating (scaled by 100) and feedback count for a transaction.
    async fn rating_summary(&self, transaction_id: u64) -> Result<ScaledRating>;
}

/// State-changing calls. Implementations submit through a signer and wait for one
/// confirmation; nothing is retried.
#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Records a spending transaction, returning the transaction hash once included.
    async fn record_transaction(&self, submission: &SpendingSubmission) -> Result<TxHash>;
    /// Submits citizen feedback, returning the transaction hash once included.
    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<TxHash>;
    /// Dry-run gas estimate plus the node's current gas price.
    async fn quote_gas(&self, call: &LedgerCall) -> Result<GasQuote>;
}

/// A state-changing ledger call, used for gas estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    /// `recordTransaction` on the spending contract
    RecordTransaction(SpendingSubmission),
    /// `submitFeedback` on the feedback contract
    SubmitFeedback(FeedbackSubmission),
}

/// Raw gas figures returned by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasQuote {
    /// Estimated gas units
    pub gas_limit: u64,
    /// Current gas price in wei
    pub gas_price: u128,
}

/// Both read capabilities, shared across handlers and background tasks.
#[derive(Clone)]
pub struct Ledger {
    /// Spending contract reads
    pub spending: Arc<dyn SpendingLedger>,
    /// Feedback contract reads
    pub feedback: Arc<dyn FeedbackLedger>,
}

impl Ledger {
    /// Bundles two independent read adapters.
    #[must_use]
    pub fn new(spending: Arc<dyn SpendingLedger>, feedback: Arc<dyn FeedbackLedger>) -> Self {
        Self { spending, feedback }
    }

    /// Uses one adapter for both capabilities.
    #[must_use]
    pub fn from_shared<T>(inner: Arc<T>) -> Self
    where
        T: SpendingLedger + FeedbackLedger + 'static,
    {
        Self {
            spending: Arc::clone(&inner) as Arc<dyn SpendingLedger>,
            feedback: inner,
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}

/// Narrows a contract integer to `u64`, rejecting values that do not fit.
pub fn to_u64(value: U256, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::ChainUnavailable {
        message: format!("malformed ledger response: {field} = {value} does not fit in u64"),
    })
}

/// Converts a block timestamp (seconds) into a UTC datetime.
pub fn to_datetime(seconds: U256) -> Result<DateTime<Utc>> {
    let secs = to_u64(seconds, "timestamp")?;
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or_else(|| Error::ChainUnavailable {
            message: format!("malformed ledger response: timestamp {secs} out of range"),
        })
}
