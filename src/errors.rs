//! Unified error types for the spending ledger service.
//!
//! Read-path failures on the ledger connection surface as [`Error::ChainUnavailable`];
//! write-path failures surface as [`Error::TransactionRejected`] and are never retried here.

use thiserror::Error;

/// All errors produced by the aggregation layer, the write path and the configuration loader.
#[derive(Debug, Error)]
pub enum Error {
    /// RPC or network failure, or a response that failed boundary validation
    #[error("Chain unavailable: {message}")]
    ChainUnavailable {
        /// What went wrong talking to the node
        message: String,
    },

    /// The requested id has no corresponding record on the ledger
    #[error("{kind} #{id} does not exist")]
    RecordNotFound {
        /// Record kind ("Transaction", "Feedback")
        kind: &'static str,
        /// Requested id
        id: u64,
    },

    /// Application-level invariant violated before anything was submitted
    #[error("Validation failed: {message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// Signer refusal, node rejection or on-chain revert of a write
    #[error("Transaction rejected: {message}")]
    TransactionRejected {
        /// Reason reported by the signer or node
        message: String,
    },

    /// Malformed decimal amount
    #[error("Invalid amount '{input}': {reason}")]
    Parse {
        /// The offending input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Configuration file or settings problem
    #[error("Configuration error: {message}")]
    Config {
        /// Human readable reason
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unreadable environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Builds a [`Error::ChainUnavailable`] from any displayable RPC error.
    pub fn chain(err: impl std::fmt::Display) -> Self {
        Self::ChainUnavailable {
            message: err.to_string(),
        }
    }

    /// Builds a [`Error::TransactionRejected`] from any displayable signer/node error.
    pub fn rejected(err: impl std::fmt::Display) -> Self {
        Self::TransactionRejected {
            message: err.to_string(),
        }
    }

    /// Builds a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_message() {
        let err = Error::RecordNotFound {
            kind: "Transaction",
            id: 42,
        };
        assert_eq!(err.to_string(), "Transaction #42 does not exist");
    }

    #[test]
    fn test_helpers_pick_the_right_variant() {
        assert!(matches!(Error::chain("timeout"), Error::ChainUnavailable { .. }));
        assert!(matches!(
            Error::rejected("execution reverted"),
            Error::TransactionRejected { .. }
        ));
        assert!(matches!(
            Error::validation("bad rating"),
            Error::Validation { .. }
        ));
    }
}
