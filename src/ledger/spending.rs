//! Spending ledger records.
//!
//! Amounts stay in base units (`U256`, 18 decimals) at this layer; the aggregation
//! layer turns them into decimal strings.
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};

/// A project transaction as stored by the spending contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingRecord {
    /// Sequential id assigned by the contract, starting at 1
    pub id: u64,
    /// Department short code, e.g. `"MOH"`
    pub department: String,
    /// Project name
    pub project_name: String,
    /// Project category, e.g. `"Infrastructure"`
    pub project_type: String,
    /// Allocated budget in base units
    pub budget_allocated: U256,
    /// Amount spent so far in base units
    pub amount_spent: U256,
    /// Free-text location
    pub location: String,
    /// Free-text description
    pub description: String,
    /// Block time at recording
    pub timestamp: DateTime<Utc>,
    /// Address that recorded the transaction
    pub recorded_by: Address,
    /// Soft-delete flag
    pub is_active: bool,
}

/// Budget and spend totals aggregated by the contract for one department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepartmentTotals {
    /// Sum of allocated budgets in base units
    pub budget: U256,
    /// Sum of amounts spent in base units
    pub spent: U256,
}

/// Validated arguments for `recordTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendingSubmission {
    /// Department short code
    pub department: String,
    /// Project name
    pub project_name: String,
    /// Project category
    pub project_type: String,
    /// Allocated budget in base units
    pub budget_allocated: U256,
    /// Amount spent in base units, never above `budget_allocated`
    pub amount_spent: U256,
    /// Free-text location
    pub location: String,
    /// Free-text description
    pub description: String,
}
