//! Own-profile routes.

use axum::{extract::State, Json};
use domain::models::user::{Profile, UpdateProfileRequest};
use domain::models::User;
use persistence::repositories::{ProfileUpdate, UserRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::auth::{is_unique_violation, USERNAME_INDEX};

/// GET /api/v1/users/me
pub async fn get_me(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<Profile>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(User::from(user).into()))
}

/// PATCH /api/v1/users/me
pub async fn update_me(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let request = request.into_validated()?;

    let repo = UserRepository::new(state.pool.clone());
    let update = ProfileUpdate {
        username: request.username.as_deref(),
        full_name: request.full_name.as_deref(),
        avatar_url: request.avatar_url.as_deref(),
    };

    let user = repo
        .update_profile(user_auth.user_id, &update)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, Some(USERNAME_INDEX)) {
                ApiError::Conflict("Username already taken".to_string())
            } else {
                ApiError::from(e)
            }
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(User::from(user).into()))
}
