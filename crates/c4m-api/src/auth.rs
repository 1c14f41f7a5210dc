//! Session gate: resolves the calling employer from a session token.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use c4m_models::EmployerId;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "c4m_session";

/// Google JWKS URL for Firebase Auth.
const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Firebase token issuer prefix.
const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// JWKS cache TTL.
const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600); // 1 hour

/// Minimum spacing between JWKS fetches, whatever triggered them.
const JWKS_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Identity behind a valid session token.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSession {
    pub employer_id: EmployerId,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Exchanges session tokens for verified identities.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Fails with `Unauthenticated` for invalid or expired tokens.
    async fn verify_session(&self, token: &str) -> ApiResult<VerifiedSession>;
}

/// Decoded Firebase ID token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseClaims {
    /// User ID
    pub sub: String,
    pub email: Option<String>,
    pub iss: String,
    /// Audience (Firebase project ID)
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<FirebaseClaims> for VerifiedSession {
    fn from(claims: FirebaseClaims) -> Self {
        Self {
            employer_id: EmployerId::from(claims.sub),
            email: claims.email,
            expires_at: Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkKey {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("JWKS request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JWKS key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
}

/// Cached Google signing keys used to verify Firebase ID tokens.
pub struct JwksCache {
    http: Client,
    jwks_url: String,
    keys: RwLock<HashMap<String, DecodingKey>>,
    last_refresh: RwLock<Option<Instant>>,
    last_attempt: Mutex<Option<Instant>>,
    project_id: String,
}

impl JwksCache {
    pub fn new(project_id: impl Into<String>) -> Result<Self, JwksError> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            jwks_url: GOOGLE_JWKS_URL.to_string(),
            keys: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
            last_attempt: Mutex::new(None),
            project_id: project_id.into(),
        })
    }

    /// Fetch keys from `url` instead of Google.
    pub fn with_jwks_url(mut self, url: impl Into<String>) -> Self {
        self.jwks_url = url.into();
        self
    }

    async fn refresh_keys(&self) -> Result<usize, JwksError> {
        debug!("Refreshing JWKS keys");

        let jwks: JwksResponse = self
            .http
            .get(&self.jwks_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)?;
            keys.insert(jwk.kid, key);
        }

        let key_count = keys.len();
        *self.keys.write().await = keys;
        *self.last_refresh.write().await = Some(Instant::now());

        debug!("Refreshed {} JWKS keys", key_count);
        Ok(key_count)
    }

    /// Key for `kid`, refreshing when the cache is stale or the key is unknown.
    ///
    /// Fetch attempts are spaced by [`JWKS_MIN_REFRESH_INTERVAL`], whether
    /// they succeed or not.
    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        let stale = self
            .last_refresh
            .read()
            .await
            .map_or(true, |at| at.elapsed() > JWKS_CACHE_TTL);

        if !stale {
            if let Some(key) = self.keys.read().await.get(kid) {
                return Some(key.clone());
            }
        }

        {
            let mut last_attempt = self.last_attempt.lock().await;
            if last_attempt.is_some_and(|at| at.elapsed() < JWKS_MIN_REFRESH_INTERVAL) {
                debug!(kid, "JWKS refresh throttled");
                return self.keys.read().await.get(kid).cloned();
            }
            *last_attempt = Some(Instant::now());
        }

        if let Err(e) = self.refresh_keys().await {
            warn!("Failed to refresh JWKS keys: {}", e);
        }
        self.keys.read().await.get(kid).cloned()
    }

    /// Verify a Firebase ID token.
    pub async fn verify_token(&self, token: &str) -> ApiResult<FirebaseClaims> {
        let header = decode_header(token)
            .map_err(|e| ApiError::unauthenticated(format!("Invalid token header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| ApiError::unauthenticated("Token missing key ID"))?;

        let key = self
            .get_key(&kid)
            .await
            .ok_or_else(|| ApiError::unauthenticated("Unknown key ID"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)]);
        validation.set_audience(&[&self.project_id]);

        let token_data = decode::<FirebaseClaims>(token, &key, &validation)
            .map_err(|e| ApiError::unauthenticated(format!("Token validation failed: {}", e)))?;

        Ok(token_data.claims)
    }
}

#[async_trait]
impl SessionVerifier for JwksCache {
    async fn verify_session(&self, token: &str) -> ApiResult<VerifiedSession> {
        self.verify_token(token).await.map(VerifiedSession::from)
    }
}

/// The authenticated employer making the request.
#[derive(Debug, Clone)]
pub struct CurrentEmployer {
    pub id: EmployerId,
    pub email: Option<String>,
}

/// Session token from the `c4m_session` cookie, else a bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Exchange a session token for the employer identity.
pub async fn resolve_current_employer(
    verifier: &dyn SessionVerifier,
    token: Option<&str>,
) -> ApiResult<CurrentEmployer> {
    let token = token.ok_or_else(|| ApiError::unauthenticated("Authentication required"))?;

    match verifier.verify_session(token).await {
        Ok(session) => {
            metrics::record_session_check("ok");
            Ok(CurrentEmployer {
                id: session.employer_id,
                email: session.email,
            })
        }
        Err(e) => {
            metrics::record_session_check("rejected");
            debug!(error = %e, "Session rejected");
            Err(ApiError::unauthenticated("Your session has expired, please sign in again"))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentEmployer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers);
        resolve_current_employer(state.sessions.as_ref(), token.as_deref()).await
    }
}

/// Cookie carrying a new session.
pub fn session_cookie(token: &str, max_age: Duration) -> ApiResult<Cookie<'static>> {
    let mut cookie = Cookie::parse(format!(
        "{}={}; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age.as_secs()
    ))
    .map_err(|e| ApiError::internal(format!("Unusable session token: {}", e)))?
    .into_owned();
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    Ok(cookie)
}

/// Cookie that clears the session on the client.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{AUTHORIZATION, COOKIE};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Header names key `k1`; payload and signature are junk.
    const UNSIGNED: &str =
        "eyJhbGciOiJSUzI1NiIsImtpZCI6ImsxIiwidHlwIjoiSldUIn0.eyJzdWIiOiJ4In0.c2ln";

    #[test]
    fn test_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer header-token".parse().unwrap());
        assert_eq!(session_token(&headers).as_deref(), Some("header-token"));

        headers.insert(COOKIE, "theme=dark; c4m_session=cookie-token".parse().unwrap());
        assert_eq!(session_token(&headers).as_deref(), Some("cookie-token"));

        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def", Duration::from_secs(3600)).unwrap();
        let rendered = cookie.to_string();
        assert!(rendered.starts_with("c4m_session=abc.def"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600"));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let cache = JwksCache::new("career4me").unwrap();
        let err = resolve_current_employer(&cache, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected_without_fetching_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": []})))
            .expect(0)
            .mount(&server)
            .await;

        let cache = JwksCache::new("career4me")
            .unwrap()
            .with_jwks_url(format!("{}/jwks", server.uri()));
        let err = cache.verify_session("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_unknown_key_id_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": []})))
            .expect(1)
            .mount(&server)
            .await;

        let cache = JwksCache::new("career4me")
            .unwrap()
            .with_jwks_url(format!("{}/jwks", server.uri()));
        let err = resolve_current_employer(&cache, Some(UNSIGNED))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn test_unknown_key_ids_share_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"keys": []})))
            .expect(1)
            .mount(&server)
            .await;

        let cache = JwksCache::new("career4me")
            .unwrap()
            .with_jwks_url(format!("{}/jwks", server.uri()));
        for _ in 0..5 {
            let err = resolve_current_employer(&cache, Some(UNSIGNED))
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::Unauthenticated(_)));
        }
    }

    #[tokio::test]
    async fn test_failed_fetches_are_throttled_too() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let cache = JwksCache::new("career4me")
            .unwrap()
            .with_jwks_url(format!("{}/jwks", server.uri()));
        for _ in 0..3 {
            assert!(cache.verify_session(UNSIGNED).await.is_err());
        }
    }
}
