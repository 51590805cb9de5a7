use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};

use crate::database::models::Profile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UpdateProfileRequest;
use crate::state::AppState;

/// GET /api/profile - The caller's profile, without credential fields
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Profile> {
    let profile = state.profiles.get(auth.user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/profile - Update supplied profile fields; the body is the email as a JSON string
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<String> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let updated = state.profiles.update(auth.user_id, request).await?;
    Ok(ApiResponse::success(updated))
}
