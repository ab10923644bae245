//! Scheduled Jobs
//!
//! Background verification of the ledger invariant: every wallet balance
//! equals the sum of its transactions.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::interval;

use crate::store::{LedgerStore, Reconciliation, StoreError};

// =========================================================================
// Balance Reconciliation Job
// =========================================================================

/// Find wallets whose balance drifted from their transaction log.
/// Each mismatch is logged at error level; nothing is repaired.
pub async fn reconcile_balances(store: &LedgerStore) -> Result<Vec<Reconciliation>, JobError> {
    let mismatches = store.find_inconsistent_wallets().await?;

    for mismatch in &mismatches {
        tracing::error!(
            wallet_id = mismatch.wallet_id,
            balance = %mismatch.balance,
            transaction_sum = %mismatch.transaction_sum,
            "Wallet balance does not match its transactions"
        );
    }

    if mismatches.is_empty() {
        tracing::debug!("Balance reconciliation found no mismatches");
    }

    Ok(mismatches)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for balance reconciliation (default: 5 minutes)
    pub reconcile_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            reconcile_interval: Duration::from_secs(300),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    store: LedgerStore,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create with custom configuration
    pub fn with_config(store: LedgerStore, config: JobSchedulerConfig) -> Self {
        Self { store, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop
    async fn run(&self) {
        tracing::info!(
            interval_secs = self.config.reconcile_interval.as_secs(),
            "Job scheduler started"
        );

        let mut reconcile_interval = interval(self.config.reconcile_interval);

        loop {
            reconcile_interval.tick().await;
            if let Err(e) = reconcile_balances(&self.store).await {
                tracing::error!(error = %e, "Balance reconciliation failed");
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match reconcile_balances(&self.store).await {
            Ok(mismatches) => {
                report.inconsistent_wallets = mismatches.iter().map(|m| m.wallet_id).collect();
            }
            Err(e) => report.errors.push(format!("Balance reconciliation: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub inconsistent_wallets: Vec<i64>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

impl MaintenanceReport {
    /// No errors and no drifted wallets
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty() && self.inconsistent_wallets.is_empty()
    }
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// =========================================================================
// Tests
// =========================================================================
