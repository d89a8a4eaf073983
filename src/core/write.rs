//! Write path - validates requests application-side, then submits through a signer.
//!
//! The spending contract does not check `amount_spent <= budget_allocated` and the
//! feedback contract does not bound comment length, so both are enforced here before
//! anything reaches the chain. Rejections from the signer or node are returned as-is and
//! never retried.

use crate::{
    core::units::{CurrencyConverter, GWEI_DECIMALS, ether_to_f64, format_ether, format_units, parse_ether},
    errors::{Error, Result},
    ledger::{FeedbackSubmission, LedgerCall, LedgerWriter, SpendingSubmission},
};
use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Longest accepted feedback comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 500;
/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

fn default_amount_spent() -> String {
    "0".to_string()
}

/// A spending transaction as submitted by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Department short code
    pub department: String,
    /// Project name
    pub project_name: String,
    /// Project category
    pub project_type: String,
    /// Allocated budget as a decimal string
    pub budget_allocated: String,
    /// Amount spent as a decimal string, `"0"` when omitted
    #[serde(default = "default_amount_spent")]
    pub amount_spent: String,
    /// Free-text location
    pub location: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
}

/// Citizen feedback as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFeedback {
    /// Transaction being rated
    pub transaction_id: u64,
    /// Comment text
    pub comment: String,
    /// Rating; accepted range is 1 to 5
    pub rating: i64,
}

fn require(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Validates a new transaction and converts its amounts to base units.
///
/// # Errors
/// - [`Error::Validation`] for a missing required field, a zero budget, or spend above budget
/// - [`Error::Parse`] for a malformed amount
pub fn prepare_transaction(input: &NewTransaction) -> Result<SpendingSubmission> {
    let department = require(&input.department, "department")?;
    let project_name = require(&input.project_name, "projectName")?;
    let project_type = require(&input.project_type, "projectType")?;
    let location = require(&input.location, "location")?;

    let budget_allocated = parse_ether(&input.budget_allocated)?;
    let amount_spent = parse_ether(&input.amount_spent)?;
    if budget_allocated.is_zero() {
        return Err(Error::validation("budgetAllocated must be greater than zero"));
    }
    if amount_spent > budget_allocated {
        return Err(Error::validation(format!(
            "amountSpent ({}) exceeds budgetAllocated ({})",
            format_ether(amount_spent),
            format_ether(budget_allocated)
        )));
    }

    Ok(SpendingSubmission {
        department,
        project_name,
        project_type,
        budget_allocated,
        amount_spent,
        location,
        description: input.description.trim().to_string(),
    })
}

/// Validates citizen feedback.
///
/// # Errors
/// Returns [`Error::Validation`] when the transaction id is 0, the rating is outside
/// 1..=5, or the comment is empty or longer than 500 characters.
pub fn prepare_feedback(input: &NewFeedback) -> Result<FeedbackSubmission> {
    if input.transaction_id == 0 {
        return Err(Error::validation("transactionId must be a positive integer"));
    }
    let rating = u8::try_from(input.rating)
        .ok()
        .filter(|r| (MIN_RATING..=MAX_RATING).contains(&i64::from(*r)))
        .ok_or_else(|| {
            Error::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
                input.rating
            ))
        })?;
    let comment = require(&input.comment, "comment")?;
    let length = comment.chars().count();
    if length > MAX_COMMENT_CHARS {
        return Err(Error::validation(format!(
            "comment is {length} characters, the limit is {MAX_COMMENT_CHARS}"
        )));
    }

    Ok(FeedbackSubmission {
        transaction_id: input.transaction_id,
        comment,
        rating,
    })
}

/// Validates and records a spending transaction, returning its hash once included.
#[instrument(skip(writer, input), fields(department = %input.department))]
pub async fn record_transaction(writer: &dyn LedgerWriter, input: &NewTransaction) -> Result<TxHash> {
    let submission = prepare_transaction(input)?;
    let hash = writer.record_transaction(&submission).await?;
    info!(
        "Recorded transaction for {} ({}): {hash}",
        submission.department, submission.project_name
    );
    Ok(hash)
}

/// Validates and submits citizen feedback, returning its hash once included.
#[instrument(skip(writer, input), fields(transaction_id = input.transaction_id))]
pub async fn submit_feedback(writer: &dyn LedgerWriter, input: &NewFeedback) -> Result<TxHash> {
    let submission = prepare_feedback(input)?;
    let hash = writer.submit_feedback(&submission).await?;
    info!(
        "Submitted feedback for transaction {}: {hash}",
        submission.transaction_id
    );
    Ok(hash)
}

/// A write to price before submitting it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "method", content = "args", rename_all = "camelCase")]
pub enum WriteRequest {
    /// Price a `recordTransaction` call
    RecordTransaction(NewTransaction),
    /// Price a `submitFeedback` call
    SubmitFeedback(NewFeedback),
}

impl WriteRequest {
    /// Validates the arguments and turns them into a ledger call.
    pub fn to_call(&self) -> Result<LedgerCall> {
        match self {
            Self::RecordTransaction(input) => {
                prepare_transaction(input).map(LedgerCall::RecordTransaction)
            }
            Self::SubmitFeedback(input) => prepare_feedback(input).map(LedgerCall::SubmitFeedback),
        }
    }
}

/// Advisory gas cost for a write; the price at submission may differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    /// Estimated gas units
    pub gas_limit: u64,
    /// Gas price in gwei, as a decimal string
    pub gas_price_gwei: String,
    /// `gas_limit * gas_price` in wei
    pub total_cost_wei: String,
    /// Total cost in native units, as a decimal string
    pub total_cost: String,
    /// Total cost in display currency
    pub total_cost_display: String,
}

impl GasEstimate {
    fn new(gas_limit: u64, gas_price: u128, currency: &CurrencyConverter) -> Self {
        let total = U256::from(gas_limit).saturating_mul(U256::from(gas_price));
        Self {
            gas_limit,
            gas_price_gwei: format_units(U256::from(gas_price), GWEI_DECIMALS),
            total_cost_wei: total.to_string(),
            total_cost: format_ether(total),
            total_cost_display: currency.format(ether_to_f64(total), true),
        }
    }
}

/// Dry-runs a write and prices it at the node's current gas price.
pub async fn estimate_gas(
    writer: &dyn LedgerWriter,
    request: &WriteRequest,
    currency: &CurrencyConverter,
) -> Result<GasEstimate> {
    let call = request.to_call()?;
    let quote = writer.quote_gas(&call).await?;
    Ok(GasEstimate::new(quote.gas_limit, quote.gas_price, currency))
}
