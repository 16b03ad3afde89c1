use crate::{
    error::Result,
    models::{
        comment::*,
        like::LikeOutcome,
        post::*,
        response::{ApiResponse, PaginatedResult},
    },
    state::AppState,
    utils::middleware::{AuthUser, OptionalAuth},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub page: Option<i32>,
    pub limit: Option<i32>,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/search", get(search_posts))
        .route("/tag/:tag", get(get_posts_by_tag))
        .route("/:id", get(get_post).put(update_post).delete(delete_post))
        .route("/:id/like", post(like_post).delete(unlike_post))
        .route("/:id/comments", get(list_comments).post(create_comment))
}

/// 获取帖子列表
/// GET /api/social/posts?page=&limit=
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<Post>>>> {
    let (page, per_page) = state.page_params(query.page, query.limit);
    let posts = state.post_service.list_posts(page, per_page).await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// 发布帖子
/// POST /api/social/posts
async fn create_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Post>>)> {
    debug!("Creating post for user: {}", user.id);

    let post = state.post_service.create_post(&user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(post, "Post created successfully")),
    ))
}

/// 获取帖子详情
/// GET /api/social/posts/:id
async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<ApiResponse<PostDetail>>> {
    let viewer_id = user.as_ref().map(|u| u.id.as_str());
    let detail = state.post_service.get_post_detail(&id, viewer_id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// 修改帖子（仅作者）
/// PUT /api/social/posts/:id
async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<Post>>> {
    let post = state.post_service.update_post(&user.id, &id, request).await?;
    Ok(Json(ApiResponse::success_with_message(
        post,
        "Post updated successfully",
    )))
}

/// 删除帖子（仅作者）
/// DELETE /api/social/posts/:id
async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.post_service.delete_post(&user.id, &id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully"
    })))
}

/// 点赞；首次点赞返回 201，重复点赞返回 200
/// POST /api/social/posts/:id/like
async fn like_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<LikeOutcome>>)> {
    let outcome = state.engagement_service.like(&user.id, &id).await?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::success(outcome))))
}

/// 取消点赞
/// DELETE /api/social/posts/:id/like
async fn unlike_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let like_count = state.engagement_service.unlike(&user.id, &id).await?;

    Ok(Json(ApiResponse::success(json!({
        "like_count": like_count
    }))))
}

/// 获取帖子评论
/// GET /api/social/posts/:id/comments
async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Comment>>>> {
    let comments = state.comment_service.list_comments(&id).await?;
    Ok(Json(ApiResponse::success(comments)))
}

/// 发表评论
/// POST /api/social/posts/:id/comments
async fn create_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    Json(request): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Comment>>)> {
    let comment = state
        .comment_service
        .create_comment(&user.id, &id, request)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(comment))))
}

/// 按标签获取帖子
/// GET /api/social/posts/tag/:tag
async fn get_posts_by_tag(
    State(state): State<Arc<AppState>>,
    Path(tag): Path<String>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<Post>>>> {
    let (page, per_page) = state.page_params(query.page, query.limit);
    let posts = state.post_service.posts_by_tag(&tag, page, per_page).await?;
    Ok(Json(ApiResponse::success(posts)))
}

/// 搜索帖子
/// GET /api/social/posts/search?q=
async fn search_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<Post>>>> {
    let (page, per_page) = state.page_params(query.page, query.limit);
    let posts = state.post_service.search(&query.q, page, per_page).await?;
    Ok(Json(ApiResponse::success(posts)))
}
