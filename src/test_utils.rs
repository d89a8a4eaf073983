//! Shared test utilities for `spendwatch`.
//!
//! [`MockChain`] is an in-memory stand-in for both contracts. It implements every ledger
//! trait, hands out sequential ids like the contracts do, and can be told to fail
//! individual lookups so degradation paths can be exercised without a node.

use crate::{
    core::units::parse_ether,
    errors::{Error, Result},
    ledger::{
        DepartmentTotals, FeedbackLedger, FeedbackRecord, FeedbackSubmission, GasQuote, Ledger,
        LedgerCall, LedgerWriter, ScaledRating, SpendingLedger, SpendingRecord,
        SpendingSubmission,
    },
};
use alloy::primitives::{Address, TxHash};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing_subscriber::EnvFilter;

/// Chain id reported by the mock node (hardhat's default).
pub const MOCK_CHAIN_ID: u64 = 31_337;
/// Gas units quoted for any write.
pub const MOCK_GAS_LIMIT: u64 = 150_000;
/// Gas price quoted for any write: 2 gwei.
pub const MOCK_GAS_PRICE: u128 = 2_000_000_000;

const BASE_TIMESTAMP: i64 = 1_700_000_000;

/// Address used as `recorded_by` / `citizen` for everything the mock stores.
pub const MOCK_SIGNER: Address = Address::repeat_byte(0x11);

fn mock_timestamp(id: u64) -> DateTime<Utc> {
    let offset = i64::try_from(id).unwrap_or(i64::MAX - BASE_TIMESTAMP);
    DateTime::from_timestamp(BASE_TIMESTAMP + offset, 0).unwrap_or_default()
}

fn offline() -> Error {
    Error::chain("connection refused")
}

#[derive(Default)]
struct MockState {
    transactions: Vec<SpendingRecord>,
    feedbacks: Vec<FeedbackRecord>,
    departments: Vec<String>,
    offline: bool,
    failing_ratings: HashSet<u64>,
    failing_records: HashSet<u64>,
    failing_departments: HashSet<String>,
    reject_writes: bool,
    write_calls: usize,
    submitted_transactions: Vec<SpendingSubmission>,
    submitted_feedbacks: Vec<FeedbackSubmission>,
}

impl MockState {
    fn register_department(&mut self, department: &str) {
        if !self.departments.iter().any(|d| d == department) {
            self.departments.push(department.to_string());
        }
    }

    fn push_transaction(&mut self, submission: &SpendingSubmission) -> u64 {
        let id = self.transactions.len() as u64 + 1;
        self.register_department(&submission.department);
        self.transactions.push(SpendingRecord {
            id,
            department: submission.department.clone(),
            project_name: submission.project_name.clone(),
            project_type: submission.project_type.clone(),
            budget_allocated: submission.budget_allocated,
            amount_spent: submission.amount_spent,
            location: submission.location.clone(),
            description: submission.description.clone(),
            timestamp: mock_timestamp(id),
            recorded_by: MOCK_SIGNER,
            is_active: true,
        });
        id
    }

    fn push_feedback(&mut self, transaction_id: u64, comment: &str, rating: u8) -> u64 {
        let id = self.feedbacks.len() as u64 + 1;
        self.feedbacks.push(FeedbackRecord {
            id,
            transaction_id,
            citizen: MOCK_SIGNER,
            comment: comment.to_string(),
            rating,
            timestamp: mock_timestamp(id),
            is_active: true,
        });
        id
    }

    fn check_online(&self) -> Result<()> {
        if self.offline { Err(offline()) } else { Ok(()) }
    }
}

/// In-memory spending and feedback contracts with failure injection.
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a department to the contract's list without recording anything for it.
    pub fn register_department(&self, department: &str) {
        self.state().register_department(department);
    }

    /// Records a project with placeholder name, type and location. Amounts are decimal strings.
    pub fn add_transaction(&self, department: &str, budget: &str, spent: &str) -> Result<u64> {
        self.add_project(department, "Test Project", "Infrastructure", "Kuala Lumpur", budget, spent)
    }

    /// Records a project with every descriptive field chosen by the caller.
    pub fn add_project(
        &self,
        department: &str,
        project_name: &str,
        project_type: &str,
        location: &str,
        budget: &str,
        spent: &str,
    ) -> Result<u64> {
        let submission = SpendingSubmission {
            department: department.to_string(),
            project_name: project_name.to_string(),
            project_type: project_type.to_string(),
            budget_allocated: parse_ether(budget)?,
            amount_spent: parse_ether(spent)?,
            location: location.to_string(),
            description: format!("{project_name} in {location}"),
        };
        Ok(self.state().push_transaction(&submission))
    }

    /// Soft-deletes a transaction.
    pub fn deactivate_transaction(&self, id: u64) {
        if let Some(record) = self.state().transactions.iter_mut().find(|r| r.id == id) {
            record.is_active = false;
        }
    }

    /// Adds a feedback entry and returns its id.
    pub fn add_feedback(&self, transaction_id: u64, rating: u8) -> u64 {
        self.state()
            .push_feedback(transaction_id, "Test feedback", rating)
    }

    /// Soft-deletes a feedback entry.
    pub fn deactivate_feedback(&self, id: u64) {
        if let Some(record) = self.state().feedbacks.iter_mut().find(|r| r.id == id) {
            record.is_active = false;
        }
    }

    /// Overrides a feedback entry's block time, e.g. to put several in one block.
    pub fn set_feedback_timestamp(&self, id: u64, seconds: i64) {
        let timestamp = DateTime::from_timestamp(seconds, 0).unwrap_or_default();
        if let Some(record) = self.state().feedbacks.iter_mut().find(|r| r.id == id) {
            record.timestamp = timestamp;
        }
    }

    /// Makes every read fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.state().offline = offline;
    }

    /// Makes the rating lookup for one transaction fail.
    pub fn fail_rating(&self, transaction_id: u64) {
        self.state().failing_ratings.insert(transaction_id);
    }

    /// Makes fetching one transaction record fail.
    pub fn fail_record(&self, id: u64) {
        self.state().failing_records.insert(id);
    }

    /// Makes the totals lookup for one department fail.
    pub fn fail_department(&self, department: &str) {
        self.state().failing_departments.insert(department.to_string());
    }

    /// Makes every write (and gas quote) come back rejected.
    pub fn reject_writes(&self, reject: bool) {
        self.state().reject_writes = reject;
    }

    /// Number of write submissions attempted, rejected ones included.
    pub fn write_calls(&self) -> usize {
        self.state().write_calls
    }

    /// Spending submissions that were accepted.
    pub fn submitted_transactions(&self) -> Vec<SpendingSubmission> {
        self.state().submitted_transactions.clone()
    }

    /// Feedback submissions that were accepted.
    pub fn submitted_feedbacks(&self) -> Vec<FeedbackSubmission> {
        self.state().submitted_feedbacks.clone()
    }
}

#[async_trait]
impl SpendingLedger for MockChain {
    async fn count(&self) -> Result<u64> {
        let state = self.state();
        state.check_online()?;
        Ok(state.transactions.len() as u64)
    }

    async fn transaction(&self, id: u64) -> Result<SpendingRecord> {
        let state = self.state();
        state.check_online()?;
        if state.failing_records.contains(&id) {
            return Err(Error::chain(format!("timeout fetching transaction {id}")));
        }
        state
            .transactions
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(Error::RecordNotFound {
                kind: "Transaction",
                id,
            })
    }

    async fn department_ids(&self) -> Result<Vec<String>> {
        let state = self.state();
        state.check_online()?;
        Ok(state.departments.clone())
    }

    async fn department_totals(&self, department: &str) -> Result<DepartmentTotals> {
        let state = self.state();
        state.check_online()?;
        if state.failing_departments.contains(department) {
            return Err(Error::chain(format!("timeout fetching {department} totals")));
        }
        Ok(state
            .transactions
            .iter()
            .filter(|r| r.is_active && r.department == department)
            .fold(DepartmentTotals::default(), |totals, r| DepartmentTotals {
                budget: totals.budget + r.budget_allocated,
                spent: totals.spent + r.amount_spent,
            }))
    }

    async fn chain_id(&self) -> Result<u64> {
        self.state().check_online()?;
        Ok(MOCK_CHAIN_ID)
    }
}

#[async_trait]
impl FeedbackLedger for MockChain {
    async fn count(&self) -> Result<u64> {
        let state = self.state();
        state.check_online()?;
        Ok(state.feedbacks.len() as u64)
    }

    async fn feedback_ids_for_transaction(&self, transaction_id: u64) -> Result<Vec<u64>> {
        let state = self.state();
        state.check_online()?;
        Ok(state
            .feedbacks
            .iter()
            .filter(|f| f.transaction_id == transaction_id)
            .map(|f| f.id)
            .collect())
    }

    async fn feedback(&self, id: u64) -> Result<FeedbackRecord> {
        let state = self.state();
        state.check_online()?;
        state
            .feedbacks
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or(Error::RecordNotFound {
                kind: "Feedback",
                id,
            })
    }

    async fn rating_summary(&self, transaction_id: u64) -> Result<ScaledRating> {
        let state = self.state();
        state.check_online()?;
        if state.failing_ratings.contains(&transaction_id) {
            return Err(Error::chain(format!(
                "timeout fetching rating for {transaction_id}"
            )));
        }
        let ratings: Vec<u64> = state
            .feedbacks
            .iter()
            .filter(|f| f.is_active && f.transaction_id == transaction_id)
            .map(|f| u64::from(f.rating))
            .collect();
        let total = ratings.len() as u64;
        let average_x100 = if total == 0 {
            0
        } else {
            ratings.iter().sum::<u64>() * 100 / total
        };
        Ok(ScaledRating {
            average_x100,
            total,
        })
    }
}

#[async_trait]
impl LedgerWriter for MockChain {
    async fn record_transaction(&self, submission: &SpendingSubmission) -> Result<TxHash> {
        let mut state = self.state();
        state.write_calls += 1;
        if state.reject_writes {
            return Err(Error::rejected("execution reverted"));
        }
        let id = state.push_transaction(submission);
        state.submitted_transactions.push(submission.clone());
        Ok(TxHash::with_last_byte(u8::try_from(id).unwrap_or(u8::MAX)))
    }

    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<TxHash> {
        let mut state = self.state();
        state.write_calls += 1;
        if state.reject_writes {
            return Err(Error::rejected("user rejected transaction"));
        }
        let id = state.push_feedback(
            submission.transaction_id,
            &submission.comment,
            submission.rating,
        );
        state.submitted_feedbacks.push(submission.clone());
        Ok(TxHash::with_last_byte(u8::try_from(id).unwrap_or(u8::MAX)))
    }

    async fn quote_gas(&self, _call: &LedgerCall) -> Result<GasQuote> {
        if self.state().reject_writes {
            return Err(Error::rejected("execution reverted"));
        }
        Ok(GasQuote {
            gas_limit: MOCK_GAS_LIMIT,
            gas_price: MOCK_GAS_PRICE,
        })
    }
}

/// Creates an empty mock chain and a [`Ledger`] reading from it.
pub fn setup_ledger() -> (Arc<MockChain>, Ledger) {
    let chain = Arc::new(MockChain::new());
    let ledger = Ledger::from_shared(Arc::clone(&chain));
    (chain, ledger)
}

/// Seeds the three-project scenario: budgets `[100, 200, 50]`, spends `[90, 100, 50]`.
pub fn seed_three_projects(chain: &MockChain) -> Result<()> {
    chain.add_project("MOH", "Klinik Desa", "Healthcare", "Kelantan", "100", "90")?;
    chain.add_project("MOE", "Sekolah Baru", "Education", "Sabah", "200", "100")?;
    chain.add_project("MOT", "Jalan Raya", "Infrastructure", "Pahang", "50", "50")?;
    Ok(())
}

/// Routes `tracing` output through the test harness.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
