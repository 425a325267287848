//! Scheduled Jobs
//!
//! Background jobs run on a fixed schedule. The only job today is the daily
//! interest accrual over savings accounts.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::interest::{AccrualReport, InterestAccrualEngine};

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSchedulerConfig {
    /// Interval between interest accrual runs (default: 1 day)
    pub interest_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            interest_interval: Duration::from_secs(86_400),
        }
    }
}

/// Job Scheduler - runs periodic ledger jobs
pub struct JobScheduler {
    interest: Arc<InterestAccrualEngine>,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(interest: Arc<InterestAccrualEngine>) -> Self {
        Self {
            interest,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(interest: Arc<InterestAccrualEngine>, config: JobSchedulerConfig) -> Self {
        Self { interest, config }
    }

    /// Start the job scheduler in the background
    /// Returns a handle that can be used to abort the scheduler
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run the scheduler loop.
    ///
    /// The first run happens one full interval after start, so a restart
    /// does not accrue a second time for the same day.
    async fn run(&self) {
        tracing::info!(
            interest_interval_secs = self.config.interest_interval.as_secs(),
            "Job scheduler started"
        );

        let period = self.config.interest_interval;
        let mut interest_interval = interval_at(Instant::now() + period, period);
        interest_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interest_interval.tick().await;
            if let Err(e) = self.interest.run_once().await {
                tracing::error!(error = %e, "Interest accrual failed");
            }
        }
    }

    /// Run all jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> JobReport {
        let mut report = JobReport::default();

        match self.interest.run_once().await {
            Ok(accrual) => {
                report
                    .errors
                    .extend(accrual.errors.iter().map(|e| format!("Interest accrual: {}", e)));
                report.interest = Some(accrual);
            }
            Err(e) => report.errors.push(format!("Interest accrual: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running all jobs
#[derive(Debug, Clone, Default)]
pub struct JobReport {
    pub interest: Option<AccrualReport>,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

// =========================================================================
// Tests
// =========================================================================
