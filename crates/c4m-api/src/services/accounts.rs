//! Employer registration, password sessions and password reset.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

use c4m_firestore::EmployerRepository;
use c4m_models::{
    EmployerProfile, PasswordResetCompletion, PasswordResetRequest, Registration,
};

use crate::error::{ApiError, ApiResult};
use crate::identity::IdentityProvider;
use crate::services::deadline::within;

/// A signed-in employer and the token to hand back as a cookie.
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub token: String,
    pub max_age: Duration,
    pub employer: EmployerProfile,
}

#[derive(Clone)]
pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    employers: EmployerRepository,
    timeout: Duration,
}

impl AccountService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        employers: EmployerRepository,
        timeout: Duration,
    ) -> Self {
        Self {
            identity,
            employers,
            timeout,
        }
    }

    /// Create the identity and the employer profile that goes with it.
    pub async fn register(&self, registration: Registration) -> ApiResult<EmployerProfile> {
        let reg = registration.normalized()?;

        let existing = within(
            self.timeout,
            "find_employer_by_email",
            self.employers.find_by_email(&reg.email),
        )
        .await?;
        if existing.is_some() {
            return Err(ApiError::validation("An account with this email already exists"));
        }

        let account = within(
            self.timeout,
            "identity_sign_up",
            self.identity.sign_up(&reg.email, &reg.password, &reg.name),
        )
        .await?;

        let profile = EmployerProfile {
            id: Uuid::new_v4().to_string(),
            employer_id: account.uid,
            name: reg.name,
            email: reg.email,
            field: reg.field,
            about: None,
            location: None,
            website: None,
            avatar: None,
        };
        within(self.timeout, "create_employer", self.employers.create(&profile)).await?;
        info!(employer = %profile.employer_id, "Registered employer");
        Ok(profile)
    }

    /// Password sign-in, restricted to accounts with an employer profile.
    pub async fn sign_in(&self, email: &str, password: &str) -> ApiResult<SessionGrant> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("Please fill in all fields"));
        }

        let session = within(
            self.timeout,
            "identity_sign_in",
            self.identity.sign_in(&email, password),
        )
        .await?;

        let employer = within(
            self.timeout,
            "find_employer_by_email",
            self.employers.find_by_email(&email),
        )
        .await?
        .filter(|e| e.employer_id == session.uid);

        let Some(employer) = employer else {
            if let Err(e) = self.identity.sign_out(&session.token).await {
                warn!(error = %e, "Failed to revoke session of non-employer account");
            }
            return Err(ApiError::unauthenticated("Account not authorized as employer"));
        };

        info!(employer = %employer.employer_id, "Employer signed in");
        Ok(SessionGrant {
            token: session.token,
            max_age: session.expires_in,
            employer,
        })
    }

    pub async fn sign_out(&self, token: &str) -> ApiResult<()> {
        within(self.timeout, "identity_sign_out", self.identity.sign_out(token)).await
    }

    /// Send a reset code, but only to addresses that belong to an employer.
    pub async fn request_password_reset(&self, request: PasswordResetRequest) -> ApiResult<()> {
        let request = request.normalized()?;

        let employer = within(
            self.timeout,
            "find_employer_by_email",
            self.employers.find_by_email(&request.email),
        )
        .await?;
        if employer.is_none() {
            return Err(ApiError::validation(
                "No employer account found with this email address",
            ));
        }

        within(
            self.timeout,
            "identity_send_password_reset",
            self.identity.send_password_reset(&request.email),
        )
        .await?;
        info!("Password reset requested");
        Ok(())
    }

    pub async fn complete_password_reset(&self, completion: PasswordResetCompletion) -> ApiResult<()> {
        completion.validate()?;
        within(
            self.timeout,
            "identity_confirm_password_reset",
            self.identity
                .confirm_password_reset(completion.code.trim(), &completion.password),
        )
        .await?;
        info!("Password reset completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionVerifier;
    use crate::identity::InMemoryIdentity;
    use crate::test_support::{clock, store, TIMEOUT};

    fn fixture() -> (AccountService, Arc<InMemoryIdentity>, EmployerRepository) {
        let identity = Arc::new(InMemoryIdentity::new(clock()));
        let employers = EmployerRepository::new(store());
        let service = AccountService::new(identity.clone(), employers.clone(), TIMEOUT);
        (service, identity, employers)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            name: " Acme Ltd ".into(),
            email: email.into(),
            field: "Technology".into(),
            password: "correct-horse".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let (service, identity, _) = fixture();
        let profile = service.register(registration("HR@Acme.test")).await.unwrap();
        assert_eq!(profile.name, "Acme Ltd");
        assert_eq!(profile.email, "hr@acme.test");

        let grant = service.sign_in("hr@acme.test", "correct-horse").await.unwrap();
        assert_eq!(grant.employer, profile);
        let session = identity.verify_session(&grant.token).await.unwrap();
        assert_eq!(session.employer_id, profile.employer_id);

        service.sign_out(&grant.token).await.unwrap();
        assert!(identity.verify_session(&grant.token).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (service, _, _) = fixture();
        service.register(registration("hr@acme.test")).await.unwrap();
        let err = service.register(registration("hr@acme.test")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_invalid_registration_is_rejected() {
        let (service, _, employers) = fixture();
        let err = service.register(registration("not-an-email")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert!(employers.find_by_email("not-an-email").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_in_failures() {
        let (service, identity, _) = fixture();
        service.register(registration("hr@acme.test")).await.unwrap();

        let err = service.sign_in("  ", "x").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = service.sign_in("hr@acme.test", "wrong-pass").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));

        // An identity with no employer profile, e.g. a talent account.
        identity
            .sign_up("talent@mail.test", "talent-pass", "Ama")
            .await
            .unwrap();
        let err = service.sign_in("talent@mail.test", "talent-pass").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(ref m) if m == "Account not authorized as employer"));
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let (service, identity, _) = fixture();
        service.register(registration("hr@acme.test")).await.unwrap();

        service
            .request_password_reset(PasswordResetRequest {
                email: " HR@acme.test ".into(),
            })
            .await
            .unwrap();
        let code = identity.pending_reset_code("hr@acme.test").await.unwrap();

        let mismatch = PasswordResetCompletion {
            code: code.clone(),
            password: "fresh-pass-1".into(),
            confirm_password: "fresh-pass-2".into(),
        };
        let err = service.complete_password_reset(mismatch).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "Passwords do not match"));

        service
            .complete_password_reset(PasswordResetCompletion {
                code,
                password: "fresh-pass-1".into(),
                confirm_password: "fresh-pass-1".into(),
            })
            .await
            .unwrap();
        assert!(service.sign_in("hr@acme.test", "correct-horse").await.is_err());
        assert!(service.sign_in("hr@acme.test", "fresh-pass-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_password_reset_requires_employer_account() {
        let (service, identity, _) = fixture();
        identity
            .sign_up("talent@mail.test", "talent-pass", "Ama")
            .await
            .unwrap();

        let err = service
            .request_password_reset(PasswordResetRequest {
                email: "talent@mail.test".into(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, ApiError::Validation(ref m) if m == "No employer account found with this email address")
        );
        assert!(identity.pending_reset_code("talent@mail.test").await.is_none());
    }
}
