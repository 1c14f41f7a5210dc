//! Registration, sign-in, sign-out and password reset.

use axum::extract::State;
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::warn;

use c4m_models::{
    EmployerProfile, PasswordResetCompletion, PasswordResetRequest, Registration,
};

use crate::auth::{removal_cookie, session_cookie, SESSION_COOKIE};
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(registration): JsonBody<Registration>,
) -> ApiResult<(StatusCode, Envelope<EmployerProfile>)> {
    let profile = state.accounts.register(registration).await?;
    Ok((StatusCode::CREATED, Envelope::ok(profile)))
}

/// Exchange credentials for a session cookie.
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(body): JsonBody<SignInRequest>,
) -> ApiResult<(CookieJar, Envelope<EmployerProfile>)> {
    let grant = state.accounts.sign_in(&body.email, &body.password).await?;
    let cookie = session_cookie(&grant.token, grant.max_age)?;
    Ok((jar.add(cookie), Envelope::ok(grant.employer)))
}

pub async fn destroy_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Envelope<()>)> {
    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthenticated("No session cookie found"))?;

    if let Err(e) = state.accounts.sign_out(&token).await {
        warn!(error = %e, "Sign-out failed, clearing cookie anyway");
    }
    Ok((jar.remove(removal_cookie()), Envelope::done()))
}

/// Email a reset code to an employer address.
pub async fn request_password_reset(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<PasswordResetRequest>,
) -> ApiResult<Envelope<()>> {
    state.accounts.request_password_reset(request).await?;
    Ok(Envelope::done())
}

pub async fn complete_password_reset(
    State(state): State<AppState>,
    JsonBody(completion): JsonBody<PasswordResetCompletion>,
) -> ApiResult<Envelope<()>> {
    state.accounts.complete_password_reset(completion).await?;
    Ok(Envelope::done())
}
