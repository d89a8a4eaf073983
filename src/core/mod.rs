//! Aggregation layer - rebuilds application views from live ledger state.
//!
//! Nothing in here caches across calls; every function re-reads the ledger through
//! [`crate::ledger::Ledger`]. Functions take the ledger (and a writer, for the write path)
//! explicitly so they can run against a node or the in-memory test chain alike.

/// Department rollups and per-department totals
pub mod department;
/// Feedback listings and rating lookups
pub mod feedback;
/// Background refresh loop with a skip-if-in-flight guard
pub mod monitor;
/// Ledger-wide statistics, spending summary and admin dashboard
pub mod stats;
/// Transaction pages, lookup, filtering and search
pub mod transaction;
/// Exact unit conversion and display formatting
pub mod units;
/// Validated writes and gas estimation
pub mod write;
