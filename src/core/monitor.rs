//! Background refresh loop.
//!
//! Re-derives the overall statistics on a fixed interval and keeps the latest result for
//! the health endpoint. A tick that fires while the previous refresh is still running is
//! skipped rather than stacked.

use crate::{
    core::{
        stats::{OverallStats, overall_stats},
        units::CurrencyConverter,
    },
    ledger::Ledger,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::{sync::RwLock, time::MissedTickBehavior};
use tracing::{debug, info, warn};

/// The most recent successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSnapshot {
    /// Statistics as of `refreshed_at`
    pub stats: OverallStats,
    /// Total budget in display currency
    pub total_budget_display: String,
    /// Total spent in display currency
    pub total_spent_display: String,
    /// When the refresh finished
    pub refreshed_at: DateTime<Utc>,
}

/// What a single refresh attempt did.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// Statistics were recomputed
    Refreshed {
        /// Freshly computed statistics
        stats: OverallStats,
    },
    /// Another refresh was still running
    Skipped,
    /// The ledger could not be read
    Unavailable {
        /// Error reported by the ledger
        message: String,
    },
}

/// Clears the in-flight flag when dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Periodic refresher with a skip-if-in-flight guard.
#[derive(Debug)]
pub struct RefreshMonitor {
    ledger: Ledger,
    interval: Duration,
    currency: CurrencyConverter,
    in_flight: AtomicBool,
    latest: RwLock<Option<RefreshSnapshot>>,
}

impl RefreshMonitor {
    /// Creates a monitor; nothing runs until [`RefreshMonitor::run`] is spawned.
    #[must_use]
    pub fn new(ledger: Ledger, interval: Duration, currency: CurrencyConverter) -> Self {
        Self {
            ledger,
            interval,
            currency,
            in_flight: AtomicBool::new(false),
            latest: RwLock::new(None),
        }
    }

    /// Claims the in-flight flag, or `None` if a refresh is already running.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: &self.in_flight,
            })
    }

    /// Whether a refresh is currently running.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Latest successful refresh, if any.
    pub async fn latest(&self) -> Option<RefreshSnapshot> {
        self.latest.read().await.clone()
    }

    /// Runs one refresh unless another is in flight.
    pub async fn refresh_once(&self) -> RefreshOutcome {
        let Some(_guard) = self.try_begin() else {
            debug!("Previous refresh still running, skipping this tick");
            return RefreshOutcome::Skipped;
        };

        match overall_stats(&self.ledger).await {
            Ok(stats) => {
                let total_budget_display = self.currency.format_str(&stats.total_budget, true);
                let total_spent_display = self.currency.format_str(&stats.total_spent, true);
                info!(
                    "Refreshed stats: {} transactions, budget {total_budget_display}, spent {total_spent_display}",
                    stats.transaction_count,
                );
                *self.latest.write().await = Some(RefreshSnapshot {
                    stats: stats.clone(),
                    total_budget_display,
                    total_spent_display,
                    refreshed_at: Utc::now(),
                });
                RefreshOutcome::Refreshed { stats }
            }
            Err(e) => {
                warn!("Refresh failed, ledger not reachable: {e}");
                RefreshOutcome::Unavailable {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Ticks forever, spawning a refresh on every tick. Missed ticks are dropped.
    pub async fn run(self: Arc<Self>) {
        info!("Starting refresh loop every {:?}", self.interval);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let monitor = Arc::clone(&self);
            tokio::spawn(async move {
                monitor.refresh_once().await;
            });
        }
    }
}
