use crate::{
    error::Result,
    models::{
        notification::*,
        response::{ApiResponse, PaginatedResult},
    },
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub unread_only: Option<bool>,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

/// 获取通知列表
/// GET /api/social/notifications?unread_only=
async fn list_notifications(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<Notification>>>> {
    let (page, per_page) = state.page_params(query.page, query.limit);
    let notifications = state
        .notification_service
        .list(&user.id, query.unread_only.unwrap_or(false), page, per_page)
        .await?;
    Ok(Json(ApiResponse::success(notifications)))
}

/// GET /api/social/notifications/unread-count
async fn unread_count(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Value>>> {
    let count = state.notification_service.unread_count(&user.id).await?;
    Ok(Json(ApiResponse::success(json!({ "unread": count }))))
}

/// 标记通知为已读
/// POST /api/social/notifications/:id/read
async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.notification_service.mark_read(&user.id, &id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Notification marked as read"
    })))
}

/// 全部标记为已读
/// POST /api/social/notifications/read-all
async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<MarkAllReadResponse>>> {
    let result = state.notification_service.mark_all_read(&user.id).await?;
    Ok(Json(ApiResponse::success(result)))
}
