//! Liveness and readiness probes.

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use c4m_models::Clock;

use crate::state::AppState;

const STORE_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub service: &'static str,
    pub version: &'static str,
    pub now: DateTime<Utc>,
}

pub async fn health(State(state): State<AppState>) -> Json<Liveness> {
    Json(Liveness {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        now: state.clock.utc(),
    })
}

/// Outcome of probing one dependency.
#[derive(Debug, Serialize)]
pub struct Probe {
    pub reachable: bool,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub ready: bool,
    pub store: Probe,
}

/// Reads a sentinel document; a missing document still proves reachability.
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let started = Instant::now();
    let outcome = tokio::time::timeout(STORE_PROBE_TIMEOUT, state.store.get("_health", "_check")).await;
    let detail = match outcome {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("no answer within {:?}", STORE_PROBE_TIMEOUT)),
    };

    let store = Probe {
        reachable: detail.is_none(),
        elapsed_ms: started.elapsed().as_millis(),
        detail,
    };
    let status = if store.reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(Readiness {
            ready: store.reachable,
            store,
        }),
    )
}
