use crate::{
    error::Result,
    models::{comment::*, response::ApiResponse},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::put,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:id", put(update_comment).delete(delete_comment))
}

/// 修改评论（仅作者）
/// PUT /api/social/comments/:id
async fn update_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdateCommentRequest>,
) -> Result<Json<ApiResponse<Comment>>> {
    let comment = state
        .comment_service
        .update_comment(&user, &id, request)
        .await?;
    Ok(Json(ApiResponse::success(comment)))
}

/// 删除评论（作者或版主）
/// DELETE /api/social/comments/:id
async fn delete_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.comment_service.delete_comment(&user, &id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
