//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, patch, post, put};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    complete_password_reset, create_job, create_session, delete_job, destroy_session,
    get_analytics, get_job, get_profile, health, list_applications, list_jobs,
    list_notifications, list_shortlisted, mark_notification_read, ready, register,
    request_password_reset, update_application_status, update_job, update_profile,
    upload_avatar,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/session", post(create_session).delete(destroy_session))
        .route("/auth/password-reset", post(request_password_reset))
        .route("/auth/password-reset/confirm", post(complete_password_reset));

    let job_routes = Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route(
            "/jobs/:job_id",
            get(get_job).put(update_job).delete(delete_job),
        )
        .route("/jobs/:job_id/applications", get(list_applications))
        .route("/jobs/:job_id/shortlisted", get(list_shortlisted))
        .route(
            "/applications/:application_id/status",
            patch(update_application_status),
        );

    let employer_routes = Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/:notification_id/read", post(mark_notification_read))
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/profile/avatar", put(upload_avatar))
        .route("/analytics", get(get_analytics));

    let rate_limiter = Arc::new(RateLimiterCache::new(
        state.config.rate_limit_rps,
        state.config.rate_limit_burst,
    ));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(job_routes)
        .merge(employer_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
