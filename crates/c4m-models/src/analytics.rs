//! Dashboard analytics over an employer's active postings.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::application::{Application, ApplicationStatus};
use crate::job::{JobId, JobPosting};

/// Application totals by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApplicationCounts {
    pub total: u64,
    pub pending: u64,
    pub shortlisted: u64,
    pub rejected: u64,
}

impl ApplicationCounts {
    fn record(&mut self, status: ApplicationStatus) {
        self.total += 1;
        match status {
            ApplicationStatus::Pending => self.pending += 1,
            ApplicationStatus::Shortlisted => self.shortlisted += 1,
            ApplicationStatus::Rejected => self.rejected += 1,
        }
    }
}

/// Per-posting statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobStats {
    pub job_id: JobId,
    pub title: String,
    pub views: u64,
    pub clicks: u64,
    pub click_through_rate: f64,
    pub applications: ApplicationCounts,
    /// Rendered remaining lifetime, absent when the posting never expires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsSummary {
    pub job_count: u64,
    pub total_views: u64,
    pub total_clicks: u64,
    pub click_through_rate: f64,
    pub applications: ApplicationCounts,
    pub jobs: Vec<JobStats>,
}

/// Clicks per hundred views, to one decimal place.
pub fn click_through_rate(views: u64, clicks: u64) -> f64 {
    if views == 0 {
        return 0.0;
    }
    let pct = clicks as f64 / views as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}

impl AnalyticsSummary {
    /// Summarize `jobs` and the applications received for them.
    ///
    /// Applications for jobs outside `jobs` are ignored.
    pub fn compute(jobs: &[JobPosting], applications: &[Application], now: DateTime<Utc>) -> Self {
        let mut by_job: HashMap<&JobId, ApplicationCounts> = HashMap::new();
        for job in jobs {
            by_job.entry(&job.id).or_default();
        }
        for app in applications {
            if let Some(counts) = by_job.get_mut(&app.job_id) {
                counts.record(app.status);
            }
        }

        let mut totals = ApplicationCounts::default();
        let mut total_views = 0u64;
        let mut total_clicks = 0u64;

        let stats: Vec<JobStats> = jobs
            .iter()
            .map(|job| {
                let counts = by_job.get(&job.id).copied().unwrap_or_default();
                totals.total += counts.total;
                totals.pending += counts.pending;
                totals.shortlisted += counts.shortlisted;
                totals.rejected += counts.rejected;
                total_views += job.views;
                total_clicks += job.clicks;

                JobStats {
                    job_id: job.id.clone(),
                    title: job.title.clone(),
                    views: job.views,
                    clicks: job.clicks,
                    click_through_rate: click_through_rate(job.views, job.clicks),
                    applications: counts,
                    time_remaining: job.time_remaining(now).map(|t| t.to_string()),
                }
            })
            .collect();

        Self {
            job_count: jobs.len() as u64,
            total_views,
            total_clicks,
            click_through_rate: click_through_rate(total_views, total_clicks),
            applications: totals,
            jobs: stats,
        }
    }
}
