//! Account identities: sign-up, password sign-in and password reset.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use c4m_models::{Clock, EmployerId};

use crate::auth::{SessionVerifier, VerifiedSession};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("An account with this email already exists")]
    EmailExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password is too weak")]
    WeakPassword,

    #[error("Invalid or expired reset code. Please request a new one.")]
    InvalidResetCode,

    #[error("Too many requests. Please wait before trying again.")]
    RateLimited,

    #[error("Identity configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<IdentityError> for ApiError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::EmailExists
            | IdentityError::WeakPassword
            | IdentityError::InvalidResetCode
            | IdentityError::Rejected(_) => ApiError::validation(e.to_string()),
            IdentityError::RateLimited => ApiError::RateLimited,
            IdentityError::InvalidCredentials => ApiError::unauthenticated(e.to_string()),
            IdentityError::Config(msg) => ApiError::internal(msg),
            IdentityError::Unavailable(_) | IdentityError::Network(_) => {
                ApiError::remote_store(e.to_string())
            }
        }
    }
}

/// A newly created identity.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityAccount {
    pub uid: EmployerId,
}

/// Token returned by a successful password sign-in.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub uid: EmployerId,
    pub token: String,
    pub expires_in: Duration,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<IdentityAccount, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError>;

    /// Invalidate a session token. Stateless tokens simply expire.
    async fn sign_out(&self, _token: &str) -> Result<(), IdentityError> {
        Ok(())
    }

    /// Email a one-time reset code to `email`.
    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Set a new password using a code from [`send_password_reset`].
    ///
    /// [`send_password_reset`]: IdentityProvider::send_password_reset
    async fn confirm_password_reset(&self, code: &str, new_password: &str)
        -> Result<(), IdentityError>;
}

/// Firebase Identity Toolkit settings.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub api_key: String,
    pub base_url: Url,
    pub timeout: Duration,
}

impl IdentityConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://identitytoolkit.googleapis.com/v1/";

    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, IdentityError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| IdentityError::Config(format!("invalid identity URL {}: {}", base, e)))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url,
            timeout: Duration::from_secs(10),
        })
    }

    /// Reads `FIREBASE_API_KEY`, honouring `FIREBASE_AUTH_EMULATOR_HOST`.
    pub fn from_env() -> Result<Self, IdentityError> {
        let api_key = std::env::var("FIREBASE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IdentityError::Config("FIREBASE_API_KEY not set".into()))?;

        let base = match std::env::var("FIREBASE_AUTH_EMULATOR_HOST") {
            Ok(host) if !host.trim().is_empty() => {
                format!("http://{}/identitytoolkit.googleapis.com/v1/", host.trim())
            }
            _ => Self::DEFAULT_BASE_URL.to_string(),
        };
        Self::new(api_key, &base)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    id_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OobCodeRequest<'a> {
    request_type: &'static str,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    oob_code: &'a str,
    new_password: &'a str,
}

/// Both reset calls echo the account email; nothing else is used.
#[derive(Deserialize)]
struct EmailResponse {
    #[serde(default)]
    email: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Identity Toolkit REST client.
#[derive(Clone)]
pub struct FirebaseIdentity {
    http: Client,
    config: IdentityConfig,
}

impl FirebaseIdentity {
    pub fn new(config: IdentityConfig) -> Result<Self, IdentityError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self, IdentityError> {
        Self::new(IdentityConfig::from_env()?)
    }

    fn endpoint(&self, method: &str) -> Result<Url, IdentityError> {
        // "./" keeps "accounts:" from parsing as a scheme.
        let mut url = self
            .config
            .base_url
            .join(&format!("./accounts:{}", method))
            .map_err(|e| IdentityError::Config(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.config.api_key);
        Ok(url)
    }

    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, IdentityError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.http.post(self.endpoint(method)?).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let code = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error.message)
            .unwrap_or_default();
        Err(map_error(status, &code))
    }
}

fn map_error(status: StatusCode, code: &str) -> IdentityError {
    // Codes may carry a suffix, e.g. "WEAK_PASSWORD : Password should be ...".
    let code = code.split(':').next().unwrap_or_default().trim();
    match code {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            IdentityError::InvalidCredentials
        }
        "WEAK_PASSWORD" => IdentityError::WeakPassword,
        "INVALID_EMAIL" => IdentityError::Rejected("Please provide a valid email address".into()),
        "EXPIRED_OOB_CODE" | "INVALID_OOB_CODE" => IdentityError::InvalidResetCode,
        _ if status == StatusCode::TOO_MANY_REQUESTS || code.starts_with("TOO_MANY_ATTEMPTS") => {
            IdentityError::RateLimited
        }
        _ if status.is_server_error() => IdentityError::Unavailable(format!("{} {}", status, code)),
        _ => IdentityError::Rejected(format!("Identity request failed ({})", status.as_u16())),
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<IdentityAccount, IdentityError> {
        let response: PasswordResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password,
                    display_name: Some(display_name),
                    return_secure_token: true,
                },
            )
            .await?;
        info!(uid = %response.local_id, "Created identity");
        Ok(IdentityAccount {
            uid: EmployerId::from(response.local_id),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        let response: PasswordResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password,
                    display_name: None,
                    return_secure_token: true,
                },
            )
            .await?;

        let expires_in = response
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(3600);
        debug!(uid = %response.local_id, "Password sign-in succeeded");

        Ok(IdentitySession {
            uid: EmployerId::from(response.local_id),
            token: response.id_token,
            expires_in: Duration::from_secs(expires_in),
        })
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let _: EmailResponse = self
            .call(
                "sendOobCode",
                &OobCodeRequest {
                    request_type: "PASSWORD_RESET",
                    email,
                },
            )
            .await?;
        info!("Password reset email requested");
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let response: EmailResponse = self
            .call(
                "resetPassword",
                &ResetPasswordRequest {
                    oob_code: code,
                    new_password,
                },
            )
            .await?;
        debug!(has_email = !response.email.is_empty(), "Password reset completed");
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct LocalAccount {
    uid: EmployerId,
    password: String,
}

/// Process-local identities and opaque session tokens.
///
/// Used for development runs and tests; passwords are kept in memory.
pub struct InMemoryIdentity {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    accounts: RwLock<HashMap<String, LocalAccount>>,
    sessions: RwLock<HashMap<String, VerifiedSession>>,
    /// Outstanding reset codes, keyed by code.
    resets: RwLock<HashMap<String, String>>,
}

impl InMemoryIdentity {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            ttl: Duration::from_secs(3600),
            accounts: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            resets: RwLock::new(HashMap::new()),
        }
    }

    /// Latest reset code issued for `email`, standing in for the mailbox.
    pub async fn pending_reset_code(&self, email: &str) -> Option<String> {
        self.resets
            .read()
            .await
            .iter()
            .find(|(_, owner)| owner.as_str() == email)
            .map(|(code, _)| code.clone())
    }

    /// Mint a session for `employer_id` without a password.
    pub async fn issue_session(&self, employer_id: &EmployerId, email: Option<&str>) -> String {
        let token = Uuid::new_v4().simple().to_string();
        let expires_at = self.clock.utc()
            + chrono::Duration::from_std(self.ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        self.sessions.write().await.insert(
            token.clone(),
            VerifiedSession {
                employer_id: employer_id.clone(),
                email: email.map(str::to_string),
                expires_at,
            },
        );
        token
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentity {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _display_name: &str,
    ) -> Result<IdentityAccount, IdentityError> {
        if password.len() < 6 {
            return Err(IdentityError::WeakPassword);
        }
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(IdentityError::EmailExists);
        }
        let uid = EmployerId::from(Uuid::new_v4().simple().to_string());
        accounts.insert(
            email.to_string(),
            LocalAccount {
                uid: uid.clone(),
                password: password.to_string(),
            },
        );
        Ok(IdentityAccount { uid })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentitySession, IdentityError> {
        let account = self
            .accounts
            .read()
            .await
            .get(email)
            .filter(|a| a.password == password)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = self.issue_session(&account.uid, Some(email)).await;
        Ok(IdentitySession {
            uid: account.uid,
            token,
            expires_in: self.ttl,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        if self.sessions.write().await.remove(token).is_none() {
            warn!("Sign-out for an unknown session");
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        if !self.accounts.read().await.contains_key(email) {
            return Err(IdentityError::InvalidCredentials);
        }
        let mut resets = self.resets.write().await;
        resets.retain(|_, owner| owner.as_str() != email);
        resets.insert(Uuid::new_v4().simple().to_string(), email.to_string());
        info!("Password reset code issued");
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        code: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        if new_password.len() < 6 {
            return Err(IdentityError::WeakPassword);
        }
        let email = self
            .resets
            .write()
            .await
            .remove(code)
            .ok_or(IdentityError::InvalidResetCode)?;

        let uid = {
            let mut accounts = self.accounts.write().await;
            let account = accounts
                .get_mut(&email)
                .ok_or(IdentityError::InvalidResetCode)?;
            account.password = new_password.to_string();
            account.uid.clone()
        };
        self.sessions
            .write()
            .await
            .retain(|_, session| session.employer_id != uid);
        Ok(())
    }
}

#[async_trait]
impl SessionVerifier for InMemoryIdentity {
    async fn verify_session(&self, token: &str) -> ApiResult<VerifiedSession> {
        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::unauthenticated("Unknown session"))?;
        if session.expires_at <= self.clock.utc() {
            return Err(ApiError::unauthenticated("Session expired"));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c4m_models::MutableClock;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> FirebaseIdentity {
        let config = IdentityConfig::new("test-key", &format!("{}/v1", server.uri())).unwrap();
        FirebaseIdentity::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_returns_token_and_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "email": "hr@acme.test",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "localId": "uid-1",
                "idToken": "token-1",
                "expiresIn": "3600"
            })))
            .mount(&server)
            .await;

        let session = client(&server)
            .await
            .sign_in("hr@acme.test", "secret123")
            .await
            .unwrap();
        assert_eq!(session.uid, EmployerId::from("uid-1"));
        assert_eq!(session.token, "token-1");
        assert_eq!(session.expires_in, Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_error_codes_map_to_variants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signUp"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "EMAIL_EXISTS"}
            })))
            .mount(&server)
            .await;

        let identity = client(&server).await;
        assert!(matches!(
            identity.sign_in("hr@acme.test", "nope").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            identity.sign_up("hr@acme.test", "secret123", "Acme").await,
            Err(IdentityError::EmailExists)
        ));
    }

    #[test]
    fn test_map_error_suffix_and_server_errors() {
        assert!(matches!(
            map_error(StatusCode::BAD_REQUEST, "WEAK_PASSWORD : Password should be at least 6 characters"),
            IdentityError::WeakPassword
        ));
        assert!(matches!(
            map_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            IdentityError::Unavailable(_)
        ));
    }

    #[tokio::test]
    async fn test_in_memory_sessions_expire() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let identity = InMemoryIdentity::new(clock.clone());
        identity.sign_up("hr@acme.test", "secret123", "Acme").await.unwrap();
        assert!(matches!(
            identity.sign_up("hr@acme.test", "secret123", "Acme").await,
            Err(IdentityError::EmailExists)
        ));

        let session = identity.sign_in("hr@acme.test", "secret123").await.unwrap();
        assert!(identity.verify_session(&session.token).await.is_ok());

        clock.advance(chrono::Duration::hours(2));
        assert!(identity.verify_session(&session.token).await.is_err());
    }

    #[tokio::test]
    async fn test_send_password_reset_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:sendOobCode"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "requestType": "PASSWORD_RESET",
                "email": "hr@acme.test"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"email": "hr@acme.test"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .send_password_reset("hr@acme.test")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_errors_map_to_variants() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:sendOobCode"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "TOO_MANY_ATTEMPTS_TRY_LATER"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:resetPassword"))
            .and(body_partial_json(serde_json::json!({
                "oobCode": "stale",
                "newPassword": "new-secret-1"
            })))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "EXPIRED_OOB_CODE"}
            })))
            .mount(&server)
            .await;

        let identity = client(&server).await;
        let err = identity.send_password_reset("hr@acme.test").await.unwrap_err();
        assert!(matches!(err, IdentityError::RateLimited));
        assert!(matches!(ApiError::from(err), ApiError::RateLimited));

        assert!(matches!(
            identity.confirm_password_reset("stale", "new-secret-1").await,
            Err(IdentityError::InvalidResetCode)
        ));
    }

    #[tokio::test]
    async fn test_in_memory_reset_replaces_password_once() {
        let identity = InMemoryIdentity::new(Arc::new(MutableClock::new(Utc::now())));
        identity.sign_up("hr@acme.test", "secret123", "Acme").await.unwrap();
        let before = identity.sign_in("hr@acme.test", "secret123").await.unwrap();

        assert!(matches!(
            identity.send_password_reset("nobody@acme.test").await,
            Err(IdentityError::InvalidCredentials)
        ));
        identity.send_password_reset("hr@acme.test").await.unwrap();
        let code = identity.pending_reset_code("hr@acme.test").await.unwrap();

        identity.confirm_password_reset(&code, "brand-new-pass").await.unwrap();
        assert!(identity.sign_in("hr@acme.test", "secret123").await.is_err());
        assert!(identity.sign_in("hr@acme.test", "brand-new-pass").await.is_ok());
        assert!(identity.verify_session(&before.token).await.is_err());

        assert!(matches!(
            identity.confirm_password_reset(&code, "another-pass").await,
            Err(IdentityError::InvalidResetCode)
        ));
    }
}
