use crate::{
    config::Config,
    models::response::ApiResponse,
    state::AppState,
    utils::middleware::{auth_middleware, rate_limit_middleware, request_logging_middleware},
};
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub mod comments;
pub mod feed;
pub mod follows;
pub mod notifications;
pub mod posts;
pub mod users;

/// 构建完整的应用路由，所有接口位于 /api/social 之下
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .nest("/api/social/users", users::router())
        .nest("/api/social/follows", follows::router())
        .nest("/api/social/feed", feed::router())
        .nest("/api/social/posts", posts::router())
        .nest("/api/social/comments", comments::router())
        .nest("/api/social/notifications", notifications::router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors_allowed_origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins = config
        .cors_allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    layer.allow_origin(AllowOrigin::list(origins))
}

async fn health_check() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({ "status": "ok" })))
}

async fn index(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": "rainbow-social",
        "version": env!("CARGO_PKG_VERSION"),
        "features": {
            "comments": state.is_feature_enabled("comments"),
        }
    }))
}
