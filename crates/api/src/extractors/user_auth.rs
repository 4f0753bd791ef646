//! Authenticated-user extractors.
//!
//! The access token is read from `Authorization: Bearer` first, then from the
//! access-token cookie set by the OAuth callback.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use shared::jwt::{extract_user_id, JwtConfig};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::CookieHelper;

/// The caller of an authenticated endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAuth {
    pub user_id: Uuid,
    /// Token ID of the access token.
    pub jti: String,
}

impl UserAuth {
    pub fn validate(jwt: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt
            .validate_access_token(token)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
        let user_id = extract_user_id(&claims)
            .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
        Ok(Self {
            user_id,
            jti: claims.jti,
        })
    }
}

/// Token from the Authorization header, or the cookie when there is none.
///
/// `Err` means an Authorization header is present but is not a bearer token.
fn access_token<'a>(
    headers: &'a HeaderMap,
    cookies: &CookieHelper,
) -> Result<Option<&'a str>, ApiError> {
    match headers.get(AUTHORIZATION) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Some)
            .ok_or_else(|| {
                ApiError::Unauthorized("Invalid Authorization header format".to_string())
            }),
        None => Ok(cookies.access_token(headers)),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers, &state.cookies)?
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
        UserAuth::validate(&state.jwt, token)
    }
}

/// Caller identity when present; never rejects.
///
/// Used by public pages that render differently for signed-in users.
#[derive(Debug, Clone)]
pub struct OptionalUserAuth(pub Option<UserAuth>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = access_token(&parts.headers, &state.cookies)
            .ok()
            .flatten()
            .and_then(|token| UserAuth::validate(&state.jwt, token).ok());
        Ok(OptionalUserAuth(auth))
    }
}
