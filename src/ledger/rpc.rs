//! alloy-backed ledger adapter.
//!
//! Contract return tuples are decoded into [`SpendingRecord`] / [`FeedbackRecord`] here and
//! validated before they reach the aggregation layer: ids must match the requested id and
//! integers must fit their Rust types. Anything else is reported as
//! [`Error::ChainUnavailable`].

use super::{
    DepartmentTotals, FeedbackLedger, FeedbackRecord, FeedbackSubmission, GasQuote, LedgerCall,
    LedgerWriter, ScaledRating, SpendingLedger, SpendingRecord, SpendingSubmission, to_datetime,
    to_u64,
};
use crate::{
    config::chain::ChainSettings,
    errors::{Error, Result},
};
use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{TxHash, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    sol,
};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

sol! {
    #[sol(rpc)]
    interface IGovernmentSpending {
        struct SpendingTransaction {
            uint256 id;
            string department;
            string projectName;
            string projectType;
            uint256 budgetAllocated;
            uint256 amountSpent;
            string location;
            string description;
            uint256 timestamp;
            address recordedBy;
            bool isActive;
        }

        function transactionCount() external view returns (uint256);
        function getTransaction(uint256 _transactionId) external view returns (SpendingTransaction memory);
        function getAllDepartments() external view returns (string[] memory);
        function getTotalSpendingByDepartment(string memory _department) external view returns (uint256 totalBudget, uint256 totalSpent);
        function recordTransaction(
            string memory _department,
            string memory _projectName,
            string memory _projectType,
            uint256 _budgetAllocated,
            uint256 _amountSpent,
            string memory _location,
            string memory _description
        ) external;
    }

    #[sol(rpc)]
    interface ICitizenFeedback {
        struct Feedback {
            uint256 id;
            uint256 transactionId;
            address citizen;
            string comment;
            uint8 rating;
            uint256 timestamp;
            bool isActive;
        }

        function feedbackCount() external view returns (uint256);
        function getTransactionFeedbacks(uint256 _transactionId) external view returns (uint256[] memory);
        function getFeedback(uint256 _feedbackId) external view returns (Feedback memory);
        function getTransactionRating(uint256 _transactionId) external view returns (uint256 averageRating, uint256 totalFeedbacks);
        function submitFeedback(uint256 _transactionId, string memory _comment, uint8 _rating) external;
    }
}

impl TryFrom<IGovernmentSpending::SpendingTransaction> for SpendingRecord {
    type Error = Error;

    fn try_from(raw: IGovernmentSpending::SpendingTransaction) -> Result<Self> {
        Ok(Self {
            id: to_u64(raw.id, "id")?,
            department: raw.department,
            project_name: raw.projectName,
            project_type: raw.projectType,
            budget_allocated: raw.budgetAllocated,
            amount_spent: raw.amountSpent,
            location: raw.location,
            description: raw.description,
            timestamp: to_datetime(raw.timestamp)?,
            recorded_by: raw.recordedBy,
            is_active: raw.isActive,
        })
    }
}

impl TryFrom<ICitizenFeedback::Feedback> for FeedbackRecord {
    type Error = Error;

    fn try_from(raw: ICitizenFeedback::Feedback) -> Result<Self> {
        if !(1..=5).contains(&raw.rating) {
            return Err(Error::ChainUnavailable {
                message: format!("malformed ledger response: rating {} out of range", raw.rating),
            });
        }
        Ok(Self {
            id: to_u64(raw.id, "id")?,
            transaction_id: to_u64(raw.transactionId, "transactionId")?,
            citizen: raw.citizen,
            comment: raw.comment,
            rating: raw.rating,
            timestamp: to_datetime(raw.timestamp)?,
            is_active: raw.isActive,
        })
    }
}

/// Checks that the record the node returned is the one that was asked for.
///
/// A zeroed struct means the slot was never written.
fn check_id(kind: &'static str, requested: u64, returned: u64) -> Result<()> {
    match returned {
        0 => Err(Error::RecordNotFound {
            kind,
            id: requested,
        }),
        id if id == requested => Ok(()),
        other => Err(Error::ChainUnavailable {
            message: format!("malformed ledger response: asked for {kind} #{requested}, got #{other}"),
        }),
    }
}

/// Read-only adapter over both contracts.
pub struct RpcLedger {
    provider: DynProvider,
    spending: IGovernmentSpending::IGovernmentSpendingInstance<DynProvider>,
    feedback: ICitizenFeedback::ICitizenFeedbackInstance<DynProvider>,
}

impl RpcLedger {
    /// Connects to the configured node without a signer.
    #[instrument(skip(settings), fields(network = %settings.network))]
    pub async fn connect(settings: &ChainSettings) -> Result<Self> {
        let rpc_url = settings.rpc_url();
        let provider = ProviderBuilder::new()
            .connect(&rpc_url)
            .await
            .map_err(Error::chain)?
            .erased();
        info!("Connected read-only ledger adapter to {rpc_url}");
        Self::with_provider(provider, settings)
    }

    fn with_provider(provider: DynProvider, settings: &ChainSettings) -> Result<Self> {
        let spending = IGovernmentSpending::new(settings.spending_address()?, provider.clone());
        let feedback = ICitizenFeedback::new(settings.feedback_address()?, provider.clone());
        Ok(Self {
            provider,
            spending,
            feedback,
        })
    }
}

#[async_trait]
impl SpendingLedger for RpcLedger {
    async fn count(&self) -> Result<u64> {
        let count = self
            .spending
            .transactionCount()
            .call()
            .await
            .map_err(Error::chain)?;
        to_u64(count, "transactionCount")
    }

    async fn transaction(&self, id: u64) -> Result<SpendingRecord> {
        let raw = self
            .spending
            .getTransaction(U256::from(id))
            .call()
            .await
            .map_err(Error::chain)?;
        let record = SpendingRecord::try_from(raw)?;
        check_id("Transaction", id, record.id)?;
        Ok(record)
    }

    async fn department_ids(&self) -> Result<Vec<String>> {
        self.spending
            .getAllDepartments()
            .call()
            .await
            .map_err(Error::chain)
    }

    async fn department_totals(&self, department: &str) -> Result<DepartmentTotals> {
        let totals = self
            .spending
            .getTotalSpendingByDepartment(department.to_string())
            .call()
            .await
            .map_err(Error::chain)?;
        Ok(DepartmentTotals {
            budget: totals.totalBudget,
            spent: totals.totalSpent,
        })
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider.get_chain_id().await.map_err(Error::chain)
    }
}

#[async_trait]
impl FeedbackLedger for RpcLedger {
    async fn count(&self) -> Result<u64> {
        let count = self
            .feedback
            .feedbackCount()
            .call()
            .await
            .map_err(Error::chain)?;
        to_u64(count, "feedbackCount")
    }

    async fn feedback_ids_for_transaction(&self, transaction_id: u64) -> Result<Vec<u64>> {
        let ids = self
            .feedback
            .getTransactionFeedbacks(U256::from(transaction_id))
            .call()
            .await
            .map_err(Error::chain)?;
        ids.into_iter().map(|id| to_u64(id, "feedbackId")).collect()
    }

    async fn feedback(&self, id: u64) -> Result<FeedbackRecord> {
        let raw = self
            .feedback
            .getFeedback(U256::from(id))
            .call()
            .await
            .map_err(Error::chain)?;
        let record = FeedbackRecord::try_from(raw)?;
        check_id("Feedback", id, record.id)?;
        Ok(record)
    }

    async fn rating_summary(&self, transaction_id: u64) -> Result<ScaledRating> {
        let rating = self
            .feedback
            .getTransactionRating(U256::from(transaction_id))
            .call()
            .await
            .map_err(Error::chain)?;
        Ok(ScaledRating {
            average_x100: to_u64(rating.averageRating, "averageRating")?,
            total: to_u64(rating.totalFeedbacks, "totalFeedbacks")?,
        })
    }
}

/// Signing adapter for the write path.
pub struct RpcLedgerWriter {
    provider: DynProvider,
    spending: IGovernmentSpending::IGovernmentSpendingInstance<DynProvider>,
    feedback: ICitizenFeedback::ICitizenFeedbackInstance<DynProvider>,
}

impl RpcLedgerWriter {
    /// Connects to the configured node, signing every call with `signer`.
    #[instrument(skip(settings, signer), fields(network = %settings.network, signer = %signer.address()))]
    pub async fn connect(settings: &ChainSettings, signer: PrivateKeySigner) -> Result<Self> {
        let rpc_url = settings.rpc_url();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect(&rpc_url)
            .await
            .map_err(Error::chain)?
            .erased();
        info!("Connected signing ledger adapter to {rpc_url}");
        Ok(Self {
            spending: IGovernmentSpending::new(settings.spending_address()?, provider.clone()),
            feedback: ICitizenFeedback::new(settings.feedback_address()?, provider.clone()),
            provider,
        })
    }
}

/// Waits for one confirmation and turns a reverted receipt into a rejection.
async fn confirm(pending: PendingTransactionBuilder<Ethereum>) -> Result<TxHash> {
    let hash = *pending.tx_hash();
    debug!("Submitted {hash}, waiting for inclusion");
    let receipt = pending
        .with_required_confirmations(1)
        .get_receipt()
        .await
        .map_err(Error::rejected)?;
    if !receipt.status() {
        warn!("Transaction {hash} reverted");
        return Err(Error::TransactionRejected {
            message: format!("transaction {hash} reverted"),
        });
    }
    Ok(hash)
}

#[async_trait]
impl LedgerWriter for RpcLedgerWriter {
    async fn record_transaction(&self, submission: &SpendingSubmission) -> Result<TxHash> {
        let pending = self
            .spending
            .recordTransaction(
                submission.department.clone(),
                submission.project_name.clone(),
                submission.project_type.clone(),
                submission.budget_allocated,
                submission.amount_spent,
                submission.location.clone(),
                submission.description.clone(),
            )
            .send()
            .await
            .map_err(Error::rejected)?;
        confirm(pending).await
    }

    async fn submit_feedback(&self, submission: &FeedbackSubmission) -> Result<TxHash> {
        let pending = self
            .feedback
            .submitFeedback(
                U256::from(submission.transaction_id),
                submission.comment.clone(),
                submission.rating,
            )
            .send()
            .await
            .map_err(Error::rejected)?;
        confirm(pending).await
    }

    async fn quote_gas(&self, call: &LedgerCall) -> Result<GasQuote> {
        let gas_limit = match call {
            LedgerCall::RecordTransaction(s) => self
                .spending
                .recordTransaction(
                    s.department.clone(),
                    s.project_name.clone(),
                    s.project_type.clone(),
                    s.budget_allocated,
                    s.amount_spent,
                    s.location.clone(),
                    s.description.clone(),
                )
                .estimate_gas()
                .await
                .map_err(Error::rejected)?,
            LedgerCall::SubmitFeedback(s) => self
                .feedback
                .submitFeedback(U256::from(s.transaction_id), s.comment.clone(), s.rating)
                .estimate_gas()
                .await
                .map_err(Error::rejected)?,
        };
        let gas_price = self.provider.get_gas_price().await.map_err(Error::chain)?;
        Ok(GasQuote {
            gas_limit,
            gas_price,
        })
    }
}
