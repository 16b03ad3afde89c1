use crate::{
    error::Result,
    models::{post::Post, response::{ApiResponse, PaginatedResult}},
    state::AppState,
    utils::middleware::AuthUser,
};
use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(get_feed))
}

/// 获取关注的人发布的帖子
/// GET /api/social/feed?page=&limit=
async fn get_feed(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<Post>>>> {
    let (page, per_page) = state.page_params(query.page, query.limit);
    debug!("Getting feed for {} (page {}, per_page {})", user.id, page, per_page);

    let feed = state.feed_service.feed(&user.id, page, per_page).await?;
    Ok(Json(ApiResponse::success(feed)))
}
