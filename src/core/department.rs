//! Department analytics - per-department budget rollups joined with project ratings.

use crate::{
    config::departments::DepartmentCatalog,
    core::{
        transaction::{SpendingTransaction, all_active_transactions},
        units::{format_ether, percent_of},
    },
    errors::Result,
    ledger::{DepartmentTotals, Ledger},
};
use alloy::primitives::U256;
use serde::Serialize;
use tracing::{debug, instrument, warn};

/// Spending totals for one department, as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSpending {
    /// Department code
    pub department: String,
    /// Total allocated budget as a decimal string
    pub total_budget: String,
    /// Total spent as a decimal string
    pub total_spent: String,
    /// `total_spent / total_budget * 100`, 0 when the budget is 0
    pub utilization_rate: f64,
}

impl DepartmentSpending {
    fn new(department: &str, totals: DepartmentTotals) -> Self {
        Self {
            department: department.to_string(),
            total_budget: format_ether(totals.budget),
            total_spent: format_ether(totals.spent),
            utilization_rate: percent_of(totals.spent, totals.budget),
        }
    }
}

/// Department rollup for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentAnalytics {
    /// Department code
    pub id: String,
    /// Display name from the catalog, or the code
    pub name: String,
    /// Localized display name, when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_ms: Option<String>,
    /// Total allocated budget as a decimal string
    pub total_budget: String,
    /// Total spent as a decimal string
    pub total_spent: String,
    /// `total_spent / total_budget * 100`, 0 when the budget is 0
    pub utilization_rate: f64,
    /// Active transactions for this department
    pub project_count: usize,
    /// Mean of each project's average rating, 0 without projects
    pub average_rating: f64,
    /// Total allocated budget in base units, used for ordering
    #[serde(skip)]
    pub budget_wei: U256,
}

/// Ledger totals for one department.
pub async fn department_spending(ledger: &Ledger, department: &str) -> Result<DepartmentSpending> {
    let totals = ledger.spending.department_totals(department).await?;
    Ok(DepartmentSpending::new(department, totals))
}

/// Project count and mean project rating for one department.
#[allow(clippy::cast_precision_loss)]
fn project_stats(department: &str, transactions: &[SpendingTransaction]) -> (usize, f64) {
    let ratings: Vec<f64> = transactions
        .iter()
        .filter(|tx| tx.department == department)
        .map(|tx| tx.rating.average)
        .collect();
    if ratings.is_empty() {
        return (0, 0.0);
    }
    (ratings.len(), ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// Builds one department's rollup from ledger totals and the active transaction set.
#[must_use]
pub fn summarize_department(
    id: &str,
    totals: DepartmentTotals,
    transactions: &[SpendingTransaction],
    catalog: &DepartmentCatalog,
) -> DepartmentAnalytics {
    let (project_count, average_rating) = project_stats(id, transactions);
    let spending = DepartmentSpending::new(id, totals);
    DepartmentAnalytics {
        id: id.to_string(),
        name: catalog.display_name(id).to_string(),
        name_ms: catalog.localized_name(id).map(str::to_string),
        total_budget: spending.total_budget,
        total_spent: spending.total_spent,
        utilization_rate: spending.utilization_rate,
        project_count,
        average_rating,
        budget_wei: totals.budget,
    }
}

/// Rollups for every department on the ledger, largest budget first.
///
/// Ties keep the ledger's department order. A department whose totals cannot be read is
/// logged and left out; failing to read the department list or the transactions aborts.
#[instrument(skip(ledger, catalog))]
pub async fn department_analytics(
    ledger: &Ledger,
    catalog: &DepartmentCatalog,
) -> Result<Vec<DepartmentAnalytics>> {
    let department_ids = ledger.spending.department_ids().await?;
    let transactions = all_active_transactions(ledger).await?;

    let mut analytics = Vec::with_capacity(department_ids.len());
    for id in &department_ids {
        match ledger.spending.department_totals(id).await {
            Ok(totals) => analytics.push(summarize_department(id, totals, &transactions, catalog)),
            Err(e) => warn!("Failed to fetch analytics for department {id}: {e}"),
        }
    }

    analytics.sort_by(|a, b| b.budget_wei.cmp(&a.budget_wei));
    debug!(
        "Built analytics for {} of {} departments",
        analytics.len(),
        department_ids.len()
    );
    Ok(analytics)
}
