//! Authentication routes: password sign-up/sign-in, token rotation, logout and
//! the OAuth redirect callback.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use domain::models::user::Profile;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use shared::redirect::{redirect_origin, safe_redirect_path};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_sign_in;
use crate::services::auth::{AuthResult, AuthService, TokenPair};

/// Landing path after sign-in when `next` is missing or unsafe.
pub const DEFAULT_NEXT_PATH: &str = "/events";

const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1 and 100 characters"
    ))]
    pub full_name: Option<String>,

    #[validate(custom(function = "shared::validation::validate_username"))]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body for refresh and logout. Browser clients may send the cookie instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<TokenPair> for TokensResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: tokens.expires_in,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: Profile,
    pub tokens: TokensResponse,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user.into(),
            tokens: result.tokens.into(),
        }
    }
}

fn auth_service(state: &AppState) -> AuthService {
    AuthService::new(state.pool.clone(), state.jwt.clone())
}

/// Refresh token from the body, falling back to the refresh cookie.
fn refresh_token_from(
    state: &AppState,
    headers: &HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<String, ApiError> {
    body.and_then(|Json(req)| req.refresh_token)
        .filter(|t| !t.is_empty())
        .or_else(|| state.cookies.refresh_token(headers).map(str::to_string))
        .ok_or_else(|| ApiError::Validation("Refresh token is required".to_string()))
}

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    request.validate()?;

    let result = auth_service(&state)
        .register(
            &request.email,
            &request.password,
            request.username.as_deref(),
            request.full_name.as_deref(),
        )
        .await?;

    record_sign_in("register");
    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    request.validate()?;

    let result = auth_service(&state)
        .login(&request.email, &request.password)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Login failed");
            e
        })?;

    tracing::info!(user_id = %result.user.id, "User logged in");
    record_sign_in("password");
    Ok(Json(result.into()))
}

/// POST /api/v1/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<Response, ApiError> {
    let refresh_token = refresh_token_from(&state, &headers, body)?;
    let tokens = auth_service(&state).refresh(&refresh_token).await?;

    let mut response_headers = HeaderMap::new();
    if state.cookies.refresh_token(&headers).is_some() {
        state
            .cookies
            .set_session(&mut response_headers, &tokens.access_token, &tokens.refresh_token);
    }

    Ok((response_headers, Json(TokensResponse::from(tokens))).into_response())
}

/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> Result<Response, ApiError> {
    let refresh_token = refresh_token_from(&state, &headers, body)?;
    auth_service(&state).logout(&refresh_token).await?;

    let mut response_headers = HeaderMap::new();
    state.cookies.clear_session(&mut response_headers);
    Ok((StatusCode::NO_CONTENT, response_headers).into_response())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub next: Option<String>,
    pub provider: Option<String>,
    /// Set by the provider when the user denied consent.
    pub error: Option<String>,
}

/// `{origin}/auth/error?error=<message>`
fn error_redirect_url(origin: &str, message: &str) -> String {
    match Url::parse(&format!("{}/auth/error", origin)) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("error", message);
            url.to_string()
        }
        Err(_) => format!("{}/auth/error?error=oauth_failed", origin),
    }
}

/// GET /api/v1/auth/callback
///
/// Always answers with a redirect: to `next` with session cookies on success,
/// to the error page otherwise.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let forwarded_host = headers
        .get(FORWARDED_HOST_HEADER)
        .and_then(|v| v.to_str().ok());
    let origin = redirect_origin(
        &state.config.server.app_base_url,
        state.config.server.is_development(),
        forwarded_host,
    );

    let fail = |reason: &str| {
        tracing::warn!(reason, "OAuth callback failed");
        Redirect::temporary(&error_redirect_url(&origin, "OAuth code exchange failed"))
            .into_response()
    };

    if let Some(error) = query.error.as_deref() {
        return fail(error);
    }
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return fail("missing code");
    };
    let Some(provider) = state.oauth.clone() else {
        return fail("no provider configured");
    };
    if let Some(requested) = query.provider.as_deref() {
        if !requested.eq_ignore_ascii_case(provider.name()) {
            return fail("unsupported provider");
        }
    }

    let info = match provider.exchange_code(code).await {
        Ok(info) => info,
        Err(e) => return fail(&e.to_string()),
    };

    let result = match auth_service(&state)
        .oauth_login(provider.name(), &info)
        .await
    {
        Ok(result) => result,
        Err(e) => return fail(&e.to_string()),
    };

    tracing::info!(user_id = %result.user.id, provider = provider.name(), "OAuth sign-in");
    record_sign_in("oauth");

    let next = safe_redirect_path(query.next.as_deref(), DEFAULT_NEXT_PATH);
    let mut response = Redirect::temporary(&format!("{}{}", origin, next)).into_response();
    state.cookies.set_session(
        response.headers_mut(),
        &result.tokens.access_token,
        &result.tokens.refresh_token,
    );
    response
}
