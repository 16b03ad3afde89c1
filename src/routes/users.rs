use crate::{
    error::Result,
    models::{response::ApiResponse, user::*},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(get_current_user).put(update_current_user))
        .route("/:user_id", get(get_user_profile))
}

/// 获取当前用户资料
/// GET /api/social/users/me
async fn get_current_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<UserProfileView>>> {
    let profile = state.user_service.get_profile(&user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// 更新当前用户简介
/// PUT /api/social/users/me
async fn update_current_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>> {
    debug!("Updating profile for user: {}", user.id);

    let updated = state.user_service.update_profile(&user.id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        updated,
        "Profile updated successfully",
    )))
}

/// 获取用户主页
/// GET /api/social/users/:user_id
async fn get_user_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserProfileView>>> {
    let profile = state.user_service.get_profile(&user_id).await?;
    Ok(Json(ApiResponse::success(profile)))
}
