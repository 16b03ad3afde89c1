use crate::{
    config::Config,
    error::{AppError, Result},
    models::{comment::*, user::User},
    services::Database,
    utils::validation::{validate_max_chars, validate_not_blank},
};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct CommentService {
    db: Database,
    config: Config,
}

impl CommentService {
    pub async fn new(db: Database, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    /// 发表评论
    pub async fn create_comment(
        &self,
        author_id: &str,
        post_id: &str,
        request: CreateCommentRequest,
    ) -> Result<Comment> {
        debug!("Creating comment on post {} by {}", post_id, author_id);

        if !self.config.enable_comments {
            return Err(AppError::forbidden("Comments are disabled"));
        }

        request.validate().map_err(AppError::ValidatorError)?;
        self.check_body(&request.body)?;

        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        let now = Utc::now().trunc_subsecs(6);
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            body: request.body.trim().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_comment(&comment).await?;

        info!("Created comment {} on post {}", comment.id, post_id);
        Ok(comment)
    }

    /// 帖子下的评论，按时间正序
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        if self.db.get_post(post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }
        self.db.list_comments(post_id).await
    }

    pub async fn update_comment(
        &self,
        requester: &User,
        comment_id: &str,
        request: UpdateCommentRequest,
    ) -> Result<Comment> {
        request.validate().map_err(AppError::ValidatorError)?;
        self.check_body(&request.body)?;

        let mut comment = self.get_comment(comment_id).await?;
        if comment.author_id != requester.id {
            return Err(AppError::forbidden("Only the author can edit this comment"));
        }

        comment.body = request.body.trim().to_string();
        comment.updated_at = Utc::now().trunc_subsecs(6).max(comment.created_at);
        self.db.update_comment(&comment).await?;

        info!("Updated comment {}", comment_id);
        Ok(comment)
    }

    /// 作者或版主可以删除评论
    pub async fn delete_comment(&self, requester: &User, comment_id: &str) -> Result<()> {
        let comment = self.get_comment(comment_id).await?;
        if comment.author_id != requester.id && !requester.role.can_moderate() {
            return Err(AppError::forbidden("Not allowed to delete this comment"));
        }

        self.db.delete_comment(comment_id).await?;

        info!("Deleted comment {} (by {})", comment_id, requester.id);
        Ok(())
    }

    async fn get_comment(&self, comment_id: &str) -> Result<Comment> {
        self.db
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment"))
    }

    fn check_body(&self, body: &str) -> Result<()> {
        validate_not_blank("body", body)?;
        validate_max_chars("body", body, self.config.max_comment_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{post::Post, user::UserRole},
        services::memory_store::MemoryStore,
    };
    use std::sync::Arc;

    fn user(id: &str, role: UserRole) -> User {
        User {
            id: id.to_string(),
            username: id.to_string(),
            bio: None,
            role,
            created_at: Utc::now(),
        }
    }

    async fn setup(config: Config) -> CommentService {
        let db: Database = Arc::new(MemoryStore::new());
        let now = Utc::now();
        db.insert_post(&Post {
            id: "p1".to_string(),
            author_id: "alice".to_string(),
            title: "Hello".to_string(),
            body: "World".to_string(),
            tags: vec![],
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap();
        CommentService::new(db, &config).await.unwrap()
    }

    fn body(text: &str) -> CreateCommentRequest {
        CreateCommentRequest {
            body: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_in_order() {
        let comments = setup(Config::default()).await;
        let first = comments.create_comment("bob", "p1", body("first")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let second = comments.create_comment("carol", "p1", body(" second ")).await.unwrap();

        assert_eq!(second.body, "second");
        let listed = comments.list_comments("p1").await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let comments = setup(Config::default()).await;
        assert!(matches!(
            comments.create_comment("bob", "ghost", body("hi")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            comments.list_comments("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_body_limit_follows_config() {
        let comments = setup(Config {
            max_comment_length: 20_000,
            ..Config::default()
        })
        .await;
        let long = comments
            .create_comment("bob", "p1", body(&"x".repeat(15_000)))
            .await
            .unwrap();
        assert_eq!(long.body.len(), 15_000);

        let edited = comments
            .update_comment(
                &user("bob", UserRole::Member),
                &long.id,
                UpdateCommentRequest {
                    body: "y".repeat(12_000),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.body.len(), 12_000);

        let defaults = setup(Config::default()).await;
        assert!(matches!(
            defaults.create_comment("bob", "p1", body(&"x".repeat(5_001))).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_comments_can_be_disabled() {
        let comments = setup(Config {
            enable_comments: false,
            ..Config::default()
        })
        .await;
        assert!(matches!(
            comments.create_comment("bob", "p1", body("hi")).await,
            Err(AppError::Authorization(_))
        ));
    }

    #[tokio::test]
    async fn test_only_author_edits() {
        let comments = setup(Config::default()).await;
        let c = comments.create_comment("bob", "p1", body("hi")).await.unwrap();

        let denied = comments
            .update_comment(
                &user("carol", UserRole::Admin),
                &c.id,
                UpdateCommentRequest { body: "edited".to_string() },
            )
            .await;
        assert!(matches!(denied, Err(AppError::Authorization(_))));

        let edited = comments
            .update_comment(
                &user("bob", UserRole::Member),
                &c.id,
                UpdateCommentRequest { body: "edited".to_string() },
            )
            .await
            .unwrap();
        assert_eq!(edited.body, "edited");
    }

    #[tokio::test]
    async fn test_moderator_may_delete() {
        let comments = setup(Config::default()).await;
        let c1 = comments.create_comment("bob", "p1", body("one")).await.unwrap();
        let c2 = comments.create_comment("bob", "p1", body("two")).await.unwrap();

        assert!(matches!(
            comments.delete_comment(&user("carol", UserRole::Member), &c1.id).await,
            Err(AppError::Authorization(_))
        ));

        comments
            .delete_comment(&user("mod", UserRole::Moderator), &c1.id)
            .await
            .unwrap();
        comments
            .delete_comment(&user("bob", UserRole::Member), &c2.id)
            .await
            .unwrap();

        assert!(comments.list_comments("p1").await.unwrap().is_empty());
        assert!(matches!(
            comments.delete_comment(&user("bob", UserRole::Member), &c2.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
