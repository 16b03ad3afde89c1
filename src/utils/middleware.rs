use crate::{
    config::Config,
    error::{AppError, Result},
    models::user::User,
    state::AppState,
};
use axum::{
    body::Body,
    extract::{ConnectInfo, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32, sync::Arc};
use tracing::{debug, info, warn};

/// 按客户端 IP 分桶的限流器
pub type IpRateLimiter = RateLimiter<String, DashMapStateStore<String>, DefaultClock>;

pub fn build_rate_limiter(config: &Config) -> Result<IpRateLimiter> {
    let per_minute = NonZeroU32::new(config.rate_limit_requests).ok_or_else(|| {
        AppError::Internal("RATE_LIMIT_REQUESTS must be greater than zero".to_string())
    })?;
    let burst = NonZeroU32::new(config.rate_limit_burst).ok_or_else(|| {
        AppError::Internal("RATE_LIMIT_BURST must be greater than zero".to_string())
    })?;

    Ok(RateLimiter::dashmap(
        Quota::per_minute(per_minute).allow_burst(burst),
    ))
}

/// 认证中间件
///
/// 令牌有效时把本地用户档案放入请求扩展；令牌缺失或无效时按匿名请求继续处理，
/// 需要登录的接口由 [`AuthUser`] 提取器拒绝。令牌有效但档案加载失败时直接返回该错误。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next<Body>,
) -> std::result::Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    if let Some(token) = token {
        match app_state.auth_service.verify_jwt(&token) {
            Ok(claims) => match app_state.user_service.get_or_create_profile(&claims).await {
                Ok(user) => {
                    debug!("Authenticated user: {} ({})", user.id, user.username);
                    request.extensions_mut().insert(user);
                }
                Err(e) => {
                    warn!("Failed to load profile for user {}: {}", claims.sub, e);
                    return Err(e);
                }
            },
            Err(e) => {
                debug!("JWT verification failed: {}", e);
            }
        }
    }

    Ok(next.run(request).await)
}

/// 速率限制中间件
pub async fn rate_limit_middleware(
    State(app_state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next<Body>,
) -> std::result::Result<Response, AppError> {
    let client_ip = get_client_ip(&request);

    match app_state.rate_limiter.check_key(&client_ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            warn!("Rate limit exceeded for IP: {}", client_ip);
            Err(AppError::RateLimitExceeded)
        }
    }
}

/// 请求日志中间件
pub async fn request_logging_middleware(request: Request<Body>, next: Next<Body>) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = get_client_ip(&request);

    let start_time = std::time::Instant::now();

    debug!("Incoming request: {} {} from {}", method, uri, client_ip);

    let response = next.run(request).await;

    info!(
        "Request completed: {} {} {} - {}ms",
        method,
        uri,
        response.status().as_u16(),
        start_time.elapsed().as_millis()
    );

    response
}

/// 获取客户端 IP 地址
pub fn get_client_ip<B>(request: &Request<B>) -> String {
    let headers = request.headers();

    // 检查常见的代理头
    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 必须登录的提取器，未认证时返回 401
pub struct AuthUser(pub User);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// 可选认证提取器
pub struct OptionalAuth(pub Option<User>);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(OptionalAuth(parts.extensions.get::<User>().cloned()))
    }
}
