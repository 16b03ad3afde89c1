use crate::{
    error::Result,
    models::{follow::*, response::ApiResponse},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/:user_id/follow", post(follow_user).delete(unfollow_user))
        .route("/user/:user_id/following", get(get_following))
        .route("/user/:user_id/stats", get(get_follow_stats))
        .route("/user/:user_id/is-following", get(check_following))
}

/// 关注用户
/// POST /api/social/follows/user/:user_id/follow
async fn follow_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Follow>>> {
    debug!("User {} following user {}", user.id, user_id);

    let follow = state.follow_service.follow(&user.id, &user_id).await?;

    Ok(Json(ApiResponse::success_with_message(
        follow,
        "User followed successfully",
    )))
}

/// 取消关注用户
/// DELETE /api/social/follows/user/:user_id/follow
async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UnfollowOutcome>>> {
    debug!("User {} unfollowing user {}", user.id, user_id);

    let outcome = state.follow_service.unfollow(&user.id, &user_id).await?;

    Ok(Json(ApiResponse::success(outcome)))
}

/// 获取用户关注的人
/// GET /api/social/follows/user/:user_id/following
async fn get_following(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<String>>>> {
    let following = state.follow_service.following_of(&user_id).await?;
    Ok(Json(ApiResponse::success(following)))
}

/// 获取用户的关注统计
/// GET /api/social/follows/user/:user_id/stats
async fn get_follow_stats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<FollowStats>>> {
    let stats = state.follow_service.follow_counts(&user_id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// 检查当前用户是否关注了某用户
/// GET /api/social/follows/user/:user_id/is-following
async fn check_following(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let is_following = state.follow_service.is_following(&user.id, &user_id).await?;

    Ok(Json(ApiResponse::success(json!({
        "is_following": is_following
    }))))
}
