use crate::{
    config::Config,
    error::Result,
    services::{
        database::Database,
        auth::AuthService,
        user::UserService,
        follow::FollowService,
        post::PostService,
        feed::FeedService,
        engagement::EngagementService,
        notification::NotificationService,
        comment::CommentService,
    },
    utils::middleware::{build_rate_limiter, IpRateLimiter},
};
use std::sync::Arc;

/// 应用程序的共享状态
/// 包含所有服务和配置的引用
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 认证服务
    pub auth_service: AuthService,

    /// 用户服务
    pub user_service: UserService,

    /// 关注服务
    pub follow_service: FollowService,

    /// 帖子服务
    pub post_service: PostService,

    /// 信息流服务
    pub feed_service: FeedService,

    /// 点赞服务
    pub engagement_service: EngagementService,

    /// 通知服务
    pub notification_service: NotificationService,

    /// 评论服务
    pub comment_service: CommentService,

    /// 按客户端 IP 限流
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// 基于存储句柄构建全部服务
    pub async fn build(config: Config, db: Database) -> Result<Self> {
        let auth_service = AuthService::new(&config).await?;
        let user_service = UserService::new(db.clone(), &config).await?;
        let follow_service = FollowService::new(db.clone()).await?;
        let post_service = PostService::new(db.clone(), &config).await?;
        let feed_service = FeedService::new(db.clone()).await?;
        let notification_service = NotificationService::new(db.clone()).await?;
        let engagement_service =
            EngagementService::new(db.clone(), notification_service.clone()).await?;
        let comment_service = CommentService::new(db.clone(), &config).await?;
        let rate_limiter = Arc::new(build_rate_limiter(&config)?);

        Ok(Self {
            config,
            auth_service,
            user_service,
            follow_service,
            post_service,
            feed_service,
            engagement_service,
            notification_service,
            comment_service,
            rate_limiter,
        })
    }

    /// 检查功能是否启用
    pub fn is_feature_enabled(&self, feature: &str) -> bool {
        match feature {
            "comments" => self.config.enable_comments,
            _ => false,
        }
    }

    /// 将请求的分页参数规范化为 (page, per_page)
    pub fn page_params(&self, page: Option<i32>, limit: Option<i32>) -> (usize, usize) {
        self.config.page_params(page, limit)
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }
}
