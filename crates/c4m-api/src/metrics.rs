//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "c4m_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "c4m_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "c4m_http_requests_in_flight";

    // Job lifecycle
    pub const EXPIRED_JOBS_REAPED_TOTAL: &str = "c4m_expired_jobs_reaped_total";
    pub const EXPIRED_JOB_DELETE_FAILURES_TOTAL: &str = "c4m_expired_job_delete_failures_total";

    // Remote calls
    pub const STORE_DEADLINE_EXCEEDED_TOTAL: &str = "c4m_store_deadline_exceeded_total";
    pub const SESSION_CHECKS_TOTAL: &str = "c4m_session_checks_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "c4m_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an expired job removed by `source` ("listing" or "sweeper").
pub fn record_expired_job_reaped(source: &'static str) {
    counter!(names::EXPIRED_JOBS_REAPED_TOTAL, "source" => source).increment(1);
}

pub fn record_expired_job_delete_failure(source: &'static str) {
    counter!(names::EXPIRED_JOB_DELETE_FAILURES_TOTAL, "source" => source).increment(1);
}

pub fn record_deadline_exceeded(operation: &'static str) {
    counter!(names::STORE_DEADLINE_EXCEEDED_TOTAL, "operation" => operation).increment(1);
}

pub fn record_session_check(outcome: &'static str) {
    counter!(names::SESSION_CHECKS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collections whose next path segment is a document id.
const ID_PARENTS: &[&str] = &["jobs", "applications", "notifications"];

/// Replace document ids in a path with `:id` to bound label cardinality.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut previous = "";
    for segment in path.split('/') {
        if ID_PARENTS.contains(&previous) && !segment.is_empty() {
            out.push(":id");
        } else {
            out.push(segment);
        }
        previous = segment;
    }
    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
