use crate::{
    config::Config,
    error::Result,
    models::{
        comment::Comment,
        follow::Follow,
        like::Like,
        notification::Notification,
        post::{Post, PostQuery},
        user::User,
    },
    services::{memory_store::MemoryStore, surreal_store::SurrealStore},
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// 注入到各服务中的存储句柄
pub type Database = Arc<dyn Store>;

/// 存储抽象：事务性增删改查，唯一约束由存储层保证
#[async_trait]
pub trait Store: Send + Sync {
    /// 验证存储可用
    async fn verify_connection(&self) -> Result<()>;

    // ---- 用户 ----

    async fn get_user(&self, id: &str) -> Result<Option<User>>;

    /// 不存在时插入并返回新用户，已存在时返回已有用户
    /// username 被其他 id 占用时返回 Conflict
    async fn insert_user_if_absent(&self, user: User) -> Result<User>;

    async fn update_user(&self, user: &User) -> Result<()>;

    // ---- 关注关系 ----

    /// 插入关注边；边已存在时返回 false
    async fn insert_follow(&self, follow: Follow) -> Result<bool>;

    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> Result<bool>;

    async fn follow_exists(&self, follower_id: &str, followee_id: &str) -> Result<bool>;

    /// user 关注的所有用户 id
    async fn following_of(&self, user_id: &str) -> Result<Vec<String>>;

    async fn count_followers(&self, user_id: &str) -> Result<usize>;

    // ---- 帖子 ----

    async fn insert_post(&self, post: &Post) -> Result<()>;

    async fn get_post(&self, id: &str) -> Result<Option<Post>>;

    async fn update_post(&self, post: &Post) -> Result<()>;

    /// 原子删除帖子及其点赞、评论和指向它的通知
    async fn delete_post_cascade(&self, id: &str) -> Result<()>;

    /// 按 (created_at DESC, id DESC) 返回一页结果
    async fn find_posts(&self, query: &PostQuery, offset: usize, limit: usize) -> Result<Vec<Post>>;

    async fn count_posts(&self, query: &PostQuery) -> Result<usize>;

    // ---- 点赞 ----

    /// 原子写入点赞及可选通知；(user, post) 已存在时不写入任何内容并返回 false
    async fn record_like(&self, like: Like, notification: Option<Notification>) -> Result<bool>;

    async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool>;

    async fn count_likes(&self, post_id: &str) -> Result<usize>;

    async fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool>;

    // ---- 通知 ----

    async fn list_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Notification>>;

    async fn count_notifications(&self, recipient_id: &str, unread_only: bool) -> Result<usize>;

    /// 通知不存在或不属于 recipient 时返回 false
    async fn mark_notification_read(&self, recipient_id: &str, id: &str) -> Result<bool>;

    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<usize>;

    // ---- 评论 ----

    async fn insert_comment(&self, comment: &Comment) -> Result<()>;

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>>;

    async fn update_comment(&self, comment: &Comment) -> Result<()>;

    async fn delete_comment(&self, id: &str) -> Result<bool>;

    /// 按创建时间正序
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>>;
}

/// 根据配置创建存储
pub async fn connect(config: &Config) -> Result<Database> {
    if config.uses_memory_store() {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    info!("Initializing database connection to {}", config.database_url);
    let store = SurrealStore::connect(config).await?;
    store.define_schema().await?;
    Ok(Arc::new(store))
}
