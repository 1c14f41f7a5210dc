//! Background removal of expired job postings.
//!
//! Opt-in companion to the lazy sweep done by [`JobLifecycle`]: postings
//! whose expiry day has passed are deleted even if their owner never lists
//! them again.
//!
//! [`JobLifecycle`]: crate::services::JobLifecycle

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;
use tokio::time::interval;
use tracing::{error, info, warn};

use c4m_firestore::JobRepository;
use c4m_models::{Clock, ClockExt};

use crate::metrics;

/// Postings examined per sweep.
const SWEEP_BATCH_SIZE: u32 = 200;

pub struct ExpirySweeper {
    jobs: JobRepository,
    clock: Arc<dyn Clock>,
    interval: Duration,
    enabled: bool,
}

impl ExpirySweeper {
    pub fn new(jobs: JobRepository, clock: Arc<dyn Clock>, interval: Duration, enabled: bool) -> Self {
        Self {
            jobs,
            clock,
            interval,
            enabled,
        }
    }

    /// Start the background sweep loop.
    ///
    /// Runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Expiry sweeper is disabled");
            return;
        }

        info!("Starting expiry sweeper (interval: {:?})", self.interval);
        let mut ticker = interval(self.interval);

        loop {
            ticker.tick().await;

            match self.sweep_once().await {
                Ok(0) => {}
                Ok(deleted) => info!("Expiry sweep deleted {} jobs", deleted),
                Err(e) => error!("Expiry sweep error: {}", e),
            }
        }
    }

    /// Delete one batch of postings whose expiry day is before today.
    pub async fn sweep_once(&self) -> anyhow::Result<u32> {
        let start_of_today = self.clock.today().and_time(NaiveTime::MIN).and_utc();
        let candidates = self
            .jobs
            .list_expiring_before(start_of_today, SWEEP_BATCH_SIZE)
            .await?;

        let now = self.clock.utc();
        let mut deleted = 0u32;
        for job in candidates.iter().filter(|job| job.is_expired_at(now)) {
            match self.jobs.delete(&job.id).await {
                Ok(()) => {
                    deleted += 1;
                    metrics::record_expired_job_reaped("sweeper");
                }
                Err(e) => {
                    metrics::record_expired_job_delete_failure("sweeper");
                    warn!(job_id = %job.id, error = %e, "Failed to delete expired job");
                }
            }
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, draft, owner, store};
    use c4m_models::JobPosting;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn test_sweep_deletes_only_past_days() {
        let store = store();
        let clock = clock();
        let repo = JobRepository::new(store.clone());
        let now = clock.utc();

        let mut ids = Vec::new();
        for offset in [-3i64, 0, 5] {
            let mut fields = draft("Role").into_fields(now).unwrap();
            fields.expires_at = Some(now + ChronoDuration::days(offset));
            let job = JobPosting::new(owner(), fields, now);
            repo.create(&job).await.unwrap();
            ids.push(job.id);
        }

        let sweeper = ExpirySweeper::new(repo.clone(), clock, Duration::from_secs(60), true);
        assert_eq!(sweeper.sweep_once().await.unwrap(), 1);
        assert!(repo.get(&ids[0]).await.unwrap().is_none());
        assert!(repo.get(&ids[1]).await.unwrap().is_some());
        assert!(repo.get(&ids[2]).await.unwrap().is_some());

        assert_eq!(sweeper.sweep_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_disabled_sweeper_returns_immediately() {
        let sweeper = ExpirySweeper::new(
            JobRepository::new(store()),
            clock(),
            Duration::from_secs(60),
            false,
        );
        sweeper.run().await;
    }
}
