//! Overall statistics - ledger-wide totals rebuilt from a full transaction scan.
//!
//! Nothing here is cached: every call re-reads the counters and every active record.

use crate::{
    config::departments::DepartmentCatalog,
    core::{
        department::{DepartmentAnalytics, department_analytics},
        transaction::{ProjectStatus, SpendingTransaction, all_active_transactions, list_transactions},
        units::{CurrencyConverter, format_ether, percent_of},
    },
    errors::Result,
    ledger::Ledger,
};
use alloy::primitives::U256;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// Transactions shown on the admin dashboard.
pub const DASHBOARD_RECENT: u64 = 10;

/// Ledger-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    /// Spending ledger counter, soft-deleted records included
    pub transaction_count: u64,
    /// Feedback ledger counter
    pub feedback_count: u64,
    /// Sum of active budgets as a decimal string
    pub total_budget: String,
    /// Sum of active spend as a decimal string
    pub total_spent: String,
    /// `total_spent / total_budget * 100`, 0 when the budget is 0
    pub utilization_rate: f64,
    /// Active transactions with status In Progress
    pub active_projects: usize,
    /// Active transactions with status Completed
    pub completed_projects: usize,
    /// Mean rating over transactions that have at least one feedback
    pub average_rating: f64,
    /// Departments known to the spending ledger
    pub department_count: usize,
}

/// Exact budget and spend sums over a set of transactions.
fn sum_amounts(transactions: &[SpendingTransaction]) -> (U256, U256) {
    transactions
        .iter()
        .fold((U256::ZERO, U256::ZERO), |(budget, spent), tx| {
            (
                budget.saturating_add(tx.budget_wei),
                spent.saturating_add(tx.spent_wei),
            )
        })
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl OverallStats {
    /// Derives totals from the ledger counters and the active transaction set.
    #[must_use]
    pub fn from_transactions(
        transaction_count: u64,
        feedback_count: u64,
        department_count: usize,
        transactions: &[SpendingTransaction],
    ) -> Self {
        let (budget, spent) = sum_amounts(transactions);
        let with_status =
            |status: ProjectStatus| transactions.iter().filter(|tx| tx.status == status).count();
        let rated: Vec<f64> = transactions
            .iter()
            .filter(|tx| tx.rating.total > 0)
            .map(|tx| tx.rating.average)
            .collect();

        Self {
            transaction_count,
            feedback_count,
            total_budget: format_ether(budget),
            total_spent: format_ether(spent),
            utilization_rate: percent_of(spent, budget),
            active_projects: with_status(ProjectStatus::InProgress),
            completed_projects: with_status(ProjectStatus::Completed),
            average_rating: mean(&rated),
            department_count,
        }
    }
}

/// Recomputes ledger-wide totals from scratch.
///
/// # Errors
/// Returns [`crate::errors::Error::ChainUnavailable`] if a counter, the department list
/// or the transaction scan cannot be read.
#[instrument(skip(ledger))]
pub async fn overall_stats(ledger: &Ledger) -> Result<OverallStats> {
    let (transaction_count, feedback_count, departments) = tokio::try_join!(
        ledger.spending.count(),
        ledger.feedback.count(),
        ledger.spending.department_ids(),
    )?;
    let transactions = all_active_transactions(ledger).await?;

    let stats = OverallStats::from_transactions(
        transaction_count,
        feedback_count,
        departments.len(),
        &transactions,
    );
    debug!(
        "Overall stats: {} active of {transaction_count} transactions, budget {}",
        transactions.len(),
        stats.total_budget
    );
    Ok(stats)
}

/// Headline figures for the public transactions page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingSummary {
    /// Active transactions
    pub total_projects: usize,
    /// Sum of active budgets as a decimal string
    pub total_budget: String,
    /// Sum of active spend as a decimal string
    pub total_spent: String,
    /// Mean of the per-project utilization rates
    pub average_utilization: f64,
    /// Distinct department codes among active transactions
    pub departments: usize,
    /// Distinct project types, sorted
    pub project_types: Vec<String>,
}

/// Summary over every active transaction.
#[instrument(skip(ledger))]
pub async fn spending_summary(ledger: &Ledger) -> Result<SpendingSummary> {
    let transactions = all_active_transactions(ledger).await?;
    let (budget, spent) = sum_amounts(&transactions);
    let utilizations: Vec<f64> = transactions.iter().map(|tx| tx.utilization_rate).collect();
    let departments: BTreeSet<&str> = transactions.iter().map(|tx| tx.department.as_str()).collect();
    let project_types: BTreeSet<&str> =
        transactions.iter().map(|tx| tx.project_type.as_str()).collect();

    Ok(SpendingSummary {
        total_projects: transactions.len(),
        total_budget: format_ether(budget),
        total_spent: format_ether(spent),
        average_utilization: mean(&utilizations),
        departments: departments.len(),
        project_types: project_types.into_iter().map(str::to_string).collect(),
    })
}

/// Everything the admin dashboard renders in one payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    /// Ledger-wide totals
    pub overview: OverallStats,
    /// `overview.total_budget` in display currency
    pub total_budget_display: String,
    /// `overview.total_spent` in display currency
    pub total_spent_display: String,
    /// Newest active transactions
    pub recent_transactions: Vec<SpendingTransaction>,
    /// Department rollups, largest budget first
    pub departments: Vec<DepartmentAnalytics>,
}

/// Builds the admin dashboard.
#[instrument(skip(ledger, catalog, currency))]
pub async fn admin_dashboard(
    ledger: &Ledger,
    catalog: &DepartmentCatalog,
    currency: &CurrencyConverter,
) -> Result<AdminDashboard> {
    let overview = overall_stats(ledger).await?;
    let recent_transactions = list_transactions(ledger, DASHBOARD_RECENT, 0).await?;
    let departments = department_analytics(ledger, catalog).await?;

    Ok(AdminDashboard {
        total_budget_display: currency.format_str(&overview.total_budget, true),
        total_spent_display: currency.format_str(&overview.total_spent, true),
        overview,
        recent_transactions,
        departments,
    })
}

/// Whether the node answers a chain id query.
pub async fn is_connected(ledger: &Ledger) -> bool {
    match ledger.spending.chain_id().await {
        Ok(chain_id) => {
            debug!("Connected to chain {chain_id}");
            true
        }
        Err(e) => {
            warn!("Ledger connection check failed: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    #[tokio::test]
    async fn test_overall_stats_scenario() -> Result<()> {
        let (chain, ledger) = setup_ledger();
        chain.add_transaction("MOH", "100", "90")?;
        chain.add_transaction("MOE", "200", "100")?;
        chain.add_transaction("MOT", "50", "50")?;

        let stats = overall_stats(&ledger).await?;
        assert_eq!(stats.total_budget, "350.0");
        assert_eq!(stats.total_spent, "240.0");
        assert!((stats.utilization_rate - 68.571_428).abs() < 1e-4);
        assert_eq!(stats.transaction_count, 3);
        assert_eq!(stats.completed_projects, 2);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.department_count, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_overall_stats_excludes_inactive_and_unrated() -> Result<()> {
        let (chain, ledger) = setup_ledger();
        chain.add_transaction("MOH", "100", "10")?;
        chain.add_transaction("MOH", "100", "10")?;
        chain.add_transaction("MOE", "1000", "10")?;
        chain.add_feedback(1, 5);
        chain.add_feedback(1, 3);
        chain.add_feedback(3, 2);
        chain.deactivate_transaction(3);

        let stats = overall_stats(&ledger).await?;
        assert_eq!(stats.transaction_count, 3);
        assert_eq!(stats.feedback_count, 3);
        assert_eq!(stats.total_budget, "200.0");
        assert_eq!(stats.average_rating, 4.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_overall_stats_empty_ledger() -> Result<()> {
        let (_chain, ledger) = setup_ledger();
        let stats = overall_stats(&ledger).await?;
        assert_eq!(stats.total_budget, "0.0");
        assert_eq!(stats.utilization_rate, 0.0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.department_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_overall_stats_is_idempotent() -> Result<()> {
        let (chain, ledger) = setup_ledger();
        seed_three_projects(&chain)?;
        chain.add_feedback(2, 4);

        let first = serde_json::to_string(&overall_stats(&ledger).await?).unwrap();
        let second = serde_json::to_string(&overall_stats(&ledger).await?).unwrap();
        assert_eq!(first, second);
        Ok(())
    }

    #[tokio::test]
    async fn test_overall_stats_chain_down() {
        let (chain, ledger) = setup_ledger();
        chain.set_offline(true);
        assert!(matches!(
            overall_stats(&ledger).await,
            Err(Error::ChainUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_overall_stats_unreadable_records_abort() -> Result<()> {
        let (chain, ledger) = setup_ledger();
        seed_three_projects(&chain)?;
        for id in 1..=3 {
            chain.fail_record(id);
        }

        assert!(matches!(
            overall_stats(&ledger).await,
            Err(Error::ChainUnavailable { .. })
        ));
        assert!(matches!(
            spending_summary(&ledger).await,
            Err(Error::ChainUnavailable { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_spending_summary() -> Result<()> {
        let (chain, ledger) = setup_ledger();
        chain.add_project("MOH", "Clinic", "Healthcare", "Penang", "100", "50")?;
        chain.add_project("MOH", "Hospital", "Healthcare", "Ipoh", "100", "100")?;
        chain.add_project("MOE", "School", "Education", "Johor", "200", "0")?;

        let summary = spending_summary(&ledger).await?;
        assert_eq!(summary.total_projects, 3);
        assert_eq!(summary.total_budget, "400.0");
        assert_eq!(summary.total_spent, "150.0");
        assert_eq!(summary.average_utilization, 50.0);
        assert_eq!(summary.departments, 2);
        assert_eq!(summary.project_types, vec!["Education", "Healthcare"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_admin_dashboard() -> Result<()> {
        let (chain, ledger) = setup_ledger();
        for _ in 0..12 {
            chain.add_transaction("MOH", "1000", "100")?;
        }

        let dashboard = admin_dashboard(
            &ledger,
            &DepartmentCatalog::default(),
            &CurrencyConverter::default(),
        )
        .await?;
        assert_eq!(dashboard.recent_transactions.len(), 10);
        assert_eq!(dashboard.recent_transactions[0].id, 12);
        assert_eq!(dashboard.overview.total_budget, "12000.0");
        assert_eq!(dashboard.total_budget_display, "RM 36.0K");
        assert_eq!(dashboard.departments.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (chain, ledger) = setup_ledger();
        assert!(is_connected(&ledger).await);
        chain.set_offline(true);
        assert!(!is_connected(&ledger).await);
    }
}
