//! Application state.

use std::sync::Arc;

use tracing::info;

use c4m_firestore::{
    ApplicationRepository, DocumentStore, EmployerNotificationRepository, EmployerRepository,
    FirestoreClient, InMemoryStore, JobRepository, TalentNotificationRepository,
    TalentRepository,
};
use c4m_models::{Clock, DefaultClock};
use c4m_storage::{InMemoryObjectStore, ObjectStore, R2Client};

use crate::auth::{JwksCache, SessionVerifier};
use crate::config::{ApiConfig, StoreBackend};
use crate::identity::{FirebaseIdentity, IdentityProvider, InMemoryIdentity};
use crate::services::{
    AccountService, AnalyticsService, ApplicationService, ExpirySweeper, JobLifecycle, JobService,
    NotificationService, ProfileService,
};

/// Remote collaborators the services are built on.
pub struct Collaborators {
    pub store: Arc<dyn DocumentStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub identity: Arc<dyn IdentityProvider>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Firestore, R2 and Firebase Auth, configured from the environment.
    pub async fn from_env() -> anyhow::Result<Self> {
        let firestore = FirestoreClient::from_env().await?;
        let sessions = JwksCache::new(firestore.project_id())?;
        Ok(Self {
            store: Arc::new(firestore),
            objects: Arc::new(R2Client::from_env()?),
            sessions: Arc::new(sessions),
            identity: Arc::new(FirebaseIdentity::from_env()?),
            clock: Arc::new(DefaultClock),
        })
    }

    /// Everything in process memory; accounts vanish on restart.
    pub fn in_memory() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let identity = Arc::new(InMemoryIdentity::new(clock.clone()));
        Self {
            store: Arc::new(InMemoryStore::new()),
            objects: Arc::new(InMemoryObjectStore::default()),
            sessions: identity.clone(),
            identity,
            clock,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub clock: Arc<dyn Clock>,
    pub sessions: Arc<dyn SessionVerifier>,
    pub store: Arc<dyn DocumentStore>,
    pub jobs: JobService,
    pub lifecycle: JobLifecycle,
    pub applications: ApplicationService,
    pub notifications: NotificationService,
    pub profiles: ProfileService,
    pub accounts: AccountService,
    pub analytics: AnalyticsService,
}

impl AppState {
    /// Create new application state for the configured backend.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let collaborators = match config.store_backend {
            StoreBackend::Firestore => Collaborators::from_env().await?,
            StoreBackend::Memory => {
                info!("Using in-memory store, object storage and identities");
                Collaborators::in_memory()
            }
        };
        Ok(Self::from_parts(config, collaborators))
    }

    /// Wire services over the given collaborators.
    pub fn from_parts(config: ApiConfig, parts: Collaborators) -> Self {
        let Collaborators {
            store,
            objects,
            sessions,
            identity,
            clock,
        } = parts;
        let timeout = config.store_timeout;

        let jobs = JobService::new(JobRepository::new(store.clone()), clock.clone(), timeout);
        let lifecycle = JobLifecycle::new(jobs.clone(), clock.clone());
        let applications = ApplicationService::new(
            jobs.clone(),
            ApplicationRepository::new(store.clone()),
            TalentRepository::new(store.clone()),
            TalentNotificationRepository::new(store.clone()),
            clock.clone(),
            timeout,
        );
        let notifications =
            NotificationService::new(EmployerNotificationRepository::new(store.clone()), timeout);
        let employers = EmployerRepository::new(store.clone());
        let profiles = ProfileService::new(
            employers.clone(),
            objects,
            timeout,
            config.avatar_max_bytes,
        );
        let accounts = AccountService::new(identity, employers, timeout);
        let analytics = AnalyticsService::new(
            lifecycle.clone(),
            ApplicationRepository::new(store.clone()),
            clock.clone(),
            timeout,
        );

        Self {
            config,
            clock,
            sessions,
            store,
            jobs,
            lifecycle,
            applications,
            notifications,
            profiles,
            accounts,
            analytics,
        }
    }

    /// Background sweeper over the same store and clock.
    pub fn expiry_sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(
            JobRepository::new(self.store.clone()),
            self.clock.clone(),
            self.config.expiry_sweep_interval,
            self.config.expiry_sweep_enabled,
        )
    }
}
