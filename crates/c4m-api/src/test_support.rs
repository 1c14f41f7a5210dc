//! Fixtures shared by unit tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use c4m_firestore::InMemoryStore;
use c4m_models::{EmployerId, JobDraft, MutableClock};

pub const TIMEOUT: Duration = Duration::from_secs(5);

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

pub fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(noon()))
}

pub fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

pub fn owner() -> EmployerId {
    EmployerId::from("emp-owner")
}

pub fn intruder() -> EmployerId {
    EmployerId::from("emp-intruder")
}

pub fn draft(title: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: "Design and ship product features".to_string(),
        location: "Accra".to_string(),
        apply_link: Some("https://acme.test/careers/1".to_string()),
        skills: vec!["Rust".to_string()],
        ..JobDraft::default()
    }
}
