use crate::{
    error::{AppError, Result},
    models::follow::*,
    services::Database,
};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// 关注关系图
#[derive(Clone)]
pub struct FollowService {
    db: Database,
}

impl FollowService {
    pub async fn new(db: Database) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn follow(&self, follower_id: &str, followee_id: &str) -> Result<Follow> {
        debug!("User {} following user {}", follower_id, followee_id);

        // 防止自己关注自己
        if follower_id == followee_id {
            return Err(AppError::SelfReference);
        }

        if self.db.get_user(followee_id).await?.is_none() {
            return Err(AppError::not_found("User"));
        }

        let follow = Follow {
            id: Uuid::new_v4().to_string(),
            follower_id: follower_id.to_string(),
            followee_id: followee_id.to_string(),
            created_at: Utc::now().trunc_subsecs(6),
        };

        // 唯一约束由存储层保证，并发的重复关注只有一个成功
        if !self.db.insert_follow(follow.clone()).await? {
            return Err(AppError::AlreadyFollowing);
        }

        info!("User {} followed user {}", follower_id, followee_id);
        Ok(follow)
    }

    /// 取消关注；关系不存在时什么也不做
    pub async fn unfollow(&self, follower_id: &str, followee_id: &str) -> Result<UnfollowOutcome> {
        debug!("User {} unfollowing user {}", follower_id, followee_id);

        let removed = self.db.delete_follow(follower_id, followee_id).await?;
        if removed {
            info!("User {} unfollowed user {}", follower_id, followee_id);
        }

        Ok(UnfollowOutcome { removed })
    }

    pub async fn following_of(&self, user_id: &str) -> Result<Vec<String>> {
        self.db.following_of(user_id).await
    }

    pub async fn is_following(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        self.db.follow_exists(follower_id, followee_id).await
    }

    pub async fn follow_counts(&self, user_id: &str) -> Result<FollowStats> {
        Ok(FollowStats {
            follower_count: self.db.count_followers(user_id).await?,
            following_count: self.db.following_of(user_id).await?.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::user::{User, UserRole},
        services::memory_store::MemoryStore,
    };
    use std::sync::Arc;

    async fn setup(users: &[&str]) -> FollowService {
        let db: Database = Arc::new(MemoryStore::new());
        for id in users {
            db.insert_user_if_absent(User {
                id: id.to_string(),
                username: id.to_string(),
                bio: None,
                role: UserRole::Member,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }
        FollowService::new(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_follow_is_recorded_once() {
        let follows = setup(&["a", "b"]).await;

        follows.follow("a", "b").await.unwrap();
        let again = follows.follow("a", "b").await;

        assert!(matches!(again, Err(AppError::AlreadyFollowing)));
        assert_eq!(follows.following_of("a").await.unwrap(), vec!["b".to_string()]);
        assert!(follows.is_following("a", "b").await.unwrap());
        assert!(!follows.is_following("b", "a").await.unwrap());
    }

    #[tokio::test]
    async fn test_cannot_follow_self() {
        let follows = setup(&["a"]).await;
        assert!(matches!(
            follows.follow("a", "a").await,
            Err(AppError::SelfReference)
        ));
        assert!(follows.following_of("a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let follows = setup(&["a"]).await;
        assert!(matches!(
            follows.follow("a", "ghost").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unfollow_missing_edge_is_noop() {
        let follows = setup(&["a", "b"]).await;

        assert!(!follows.unfollow("a", "b").await.unwrap().removed);

        follows.follow("a", "b").await.unwrap();
        assert!(follows.unfollow("a", "b").await.unwrap().removed);
        assert!(follows.following_of("a").await.unwrap().is_empty());

        // 取消后可以重新关注
        follows.follow("a", "b").await.unwrap();
    }

    #[tokio::test]
    async fn test_follow_counts() {
        let follows = setup(&["a", "b", "c"]).await;
        follows.follow("a", "c").await.unwrap();
        follows.follow("b", "c").await.unwrap();
        follows.follow("c", "a").await.unwrap();

        let stats = follows.follow_counts("c").await.unwrap();
        assert_eq!(stats.follower_count, 2);
        assert_eq!(stats.following_count, 1);
    }
}
