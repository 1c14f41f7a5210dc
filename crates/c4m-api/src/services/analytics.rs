//! Dashboard analytics over an employer's active postings.

use std::sync::Arc;
use std::time::Duration;

use c4m_firestore::ApplicationRepository;
use c4m_models::{AnalyticsSummary, Clock, EmployerId};

use crate::error::ApiResult;
use crate::services::deadline::within;
use crate::services::lifecycle::JobLifecycle;

#[derive(Clone)]
pub struct AnalyticsService {
    lifecycle: JobLifecycle,
    applications: ApplicationRepository,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl AnalyticsService {
    pub fn new(
        lifecycle: JobLifecycle,
        applications: ApplicationRepository,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            lifecycle,
            applications,
            clock,
            timeout,
        }
    }

    /// Expired postings are reaped first, so they never count.
    pub async fn analytics_summary(&self, owner: &EmployerId) -> ApiResult<AnalyticsSummary> {
        let jobs = self.lifecycle.list_active_jobs(owner).await?;
        let applications = within(
            self.timeout,
            "list_employer_applications",
            self.applications.list_by_employer(owner),
        )
        .await?;

        Ok(AnalyticsSummary::compute(&jobs, &applications, self.clock.utc()))
    }
}
