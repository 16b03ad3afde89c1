use crate::{
    error::{AppError, Result},
    models::like::*,
    services::{Database, NotificationService},
};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// 点赞与点赞通知
#[derive(Clone)]
pub struct EngagementService {
    db: Database,
    notification_service: NotificationService,
}

impl EngagementService {
    pub async fn new(db: Database, notification_service: NotificationService) -> Result<Self> {
        Ok(Self {
            db,
            notification_service,
        })
    }

    /// 点赞；重复点赞返回 `created: false`，不会再产生通知
    pub async fn like(&self, user_id: &str, post_id: &str) -> Result<LikeOutcome> {
        debug!("User {} liking post {}", user_id, post_id);

        let post = self
            .db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))?;

        let like = Like {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
        };
        let notification = self
            .notification_service
            .build_like_notification(user_id, &post);

        // 点赞与通知在同一原子操作中写入
        let created = self.db.record_like(like, notification).await?;
        let like_count = self.db.count_likes(post_id).await?;

        if created {
            info!("User {} liked post {}", user_id, post_id);
        } else {
            debug!("User {} already liked post {}", user_id, post_id);
        }

        Ok(LikeOutcome {
            created,
            like_count,
        })
    }

    /// 取消点赞；已发出的通知保留
    pub async fn unlike(&self, user_id: &str, post_id: &str) -> Result<usize> {
        debug!("User {} unliking post {}", user_id, post_id);

        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        if !self.db.delete_like(user_id, post_id).await? {
            return Err(AppError::NotLiked);
        }

        info!("User {} unliked post {}", user_id, post_id);
        self.db.count_likes(post_id).await
    }

    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool> {
        self.db.has_liked(user_id, post_id).await
    }
}
