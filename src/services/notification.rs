use crate::{
    error::{AppError, Result},
    models::{
        notification::*,
        post::Post,
        response::PaginatedResult,
    },
    services::Database,
};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationService {
    db: Database,
}

impl NotificationService {
    pub async fn new(db: Database) -> Result<Self> {
        Ok(Self { db })
    }

    /// 构造点赞通知；给自己的帖子点赞不产生通知
    pub fn build_like_notification(&self, actor_id: &str, post: &Post) -> Option<Notification> {
        if post.author_id == actor_id {
            return None;
        }

        Some(Notification {
            id: Uuid::new_v4().to_string(),
            recipient_id: post.author_id.clone(),
            actor_id: actor_id.to_string(),
            verb: VERB_LIKED_POST.to_string(),
            target_post_id: post.id.clone(),
            created_at: Utc::now().trunc_subsecs(6),
            unread: true,
        })
    }

    pub async fn list(
        &self,
        recipient_id: &str,
        unread_only: bool,
        page: usize,
        per_page: usize,
    ) -> Result<PaginatedResult<Notification>> {
        debug!(
            "Listing notifications for {} (unread_only: {}, page: {})",
            recipient_id, unread_only, page
        );

        let per_page = per_page.max(1);
        let offset = PaginatedResult::<Notification>::offset(page, per_page);

        let total = self.db.count_notifications(recipient_id, unread_only).await?;
        let notifications = self
            .db
            .list_notifications(recipient_id, unread_only, offset, per_page)
            .await?;

        Ok(PaginatedResult::new(notifications, total, page, per_page))
    }

    pub async fn unread_count(&self, recipient_id: &str) -> Result<usize> {
        self.db.count_notifications(recipient_id, true).await
    }

    /// 标记单条通知为已读；不属于当前用户的通知视为不存在
    pub async fn mark_read(&self, recipient_id: &str, notification_id: &str) -> Result<()> {
        if !self
            .db
            .mark_notification_read(recipient_id, notification_id)
            .await?
        {
            return Err(AppError::not_found("Notification"));
        }

        debug!("Notification {} marked as read", notification_id);
        Ok(())
    }

    pub async fn mark_all_read(&self, recipient_id: &str) -> Result<MarkAllReadResponse> {
        let updated = self.db.mark_all_notifications_read(recipient_id).await?;
        info!("Marked {} notifications as read for {}", updated, recipient_id);
        Ok(MarkAllReadResponse { updated })
    }
}
