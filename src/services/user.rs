use crate::{
    config::Config,
    error::{AppError, Result},
    models::user::*,
    services::{auth::Claims, Database},
    utils::validation::validate_max_chars,
};
use chrono::{SubsecRound, Utc};
use tracing::{debug, info};

/// 用户服务，维护由令牌身份镜像出的本地档案
#[derive(Clone)]
pub struct UserService {
    db: Database,
    config: Config,
}

impl UserService {
    pub async fn new(db: Database, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    /// 获取或创建用户档案；角色以令牌为准
    pub async fn get_or_create_profile(&self, claims: &Claims) -> Result<User> {
        if let Some(mut existing) = self.db.get_user(&claims.sub).await? {
            if existing.role != claims.role {
                debug!(
                    "Syncing role for user {}: {:?} -> {:?}",
                    existing.id, existing.role, claims.role
                );
                existing.role = claims.role;
                self.db.update_user(&existing).await?;
            }
            return Ok(existing);
        }

        let username = if claims.username.trim().is_empty() {
            let short: String = claims.sub.chars().take(8).collect();
            format!("user_{}", short)
        } else {
            claims.username.trim().to_string()
        };

        let user = User {
            id: claims.sub.clone(),
            username,
            bio: None,
            role: claims.role,
            created_at: Utc::now().trunc_subsecs(6),
        };

        let user = self.db.insert_user_if_absent(user).await?;
        info!("Created profile for user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// 个人主页：用户信息加关注计数
    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfileView> {
        debug!("Getting profile for user: {}", user_id);

        let user = self.get_user(user_id).await?;
        let follower_count = self.db.count_followers(user_id).await?;
        let following_count = self.db.following_of(user_id).await?.len();

        Ok(UserProfileView {
            user,
            follower_count,
            following_count,
        })
    }

    pub async fn update_profile(&self, user_id: &str, request: UpdateProfileRequest) -> Result<User> {
        let mut user = self.get_user(user_id).await?;

        let bio = request
            .bio
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());
        if let Some(bio) = &bio {
            validate_max_chars("bio", bio, self.config.max_bio_length)?;
        }

        user.bio = bio;
        self.db.update_user(&user).await?;

        info!("Updated profile for user {}", user_id);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory_store::MemoryStore;
    use std::sync::Arc;

    fn claims(sub: &str, username: &str, role: UserRole) -> Claims {
        Claims {
            sub: sub.to_string(),
            username: username.to_string(),
            role,
            exp: 0,
            iat: 0,
        }
    }

    async fn service() -> UserService {
        UserService::new(Arc::new(MemoryStore::new()), &Config::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_profile_is_created_once() {
        let users = service().await;

        let first = users
            .get_or_create_profile(&claims("u1", "alice", UserRole::Member))
            .await
            .unwrap();
        let second = users
            .get_or_create_profile(&claims("u1", "alice", UserRole::Member))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.username, "alice");
    }

    #[tokio::test]
    async fn test_role_follows_token() {
        let users = service().await;
        users
            .get_or_create_profile(&claims("u1", "alice", UserRole::Member))
            .await
            .unwrap();

        let promoted = users
            .get_or_create_profile(&claims("u1", "alice", UserRole::Admin))
            .await
            .unwrap();
        assert_eq!(promoted.role, UserRole::Admin);
        assert_eq!(users.get_user("u1").await.unwrap().role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_blank_username_gets_placeholder() {
        let users = service().await;
        let user = users
            .get_or_create_profile(&claims("abcdef123456", "  ", UserRole::Member))
            .await
            .unwrap();
        assert_eq!(user.username, "user_abcdef12");
    }

    #[tokio::test]
    async fn test_update_bio() {
        let users = service().await;
        users
            .get_or_create_profile(&claims("u1", "alice", UserRole::Member))
            .await
            .unwrap();

        let updated = users
            .update_profile(
                "u1",
                UpdateProfileRequest {
                    bio: Some("  Rustacean  ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.bio.as_deref(), Some("Rustacean"));

        let too_long = users
            .update_profile(
                "u1",
                UpdateProfileRequest {
                    bio: Some("x".repeat(161)),
                },
            )
            .await;
        assert!(too_long.is_err());

        let cleared = users
            .update_profile("u1", UpdateProfileRequest { bio: Some(" ".to_string()) })
            .await
            .unwrap();
        assert_eq!(cleared.bio, None);
    }

    #[tokio::test]
    async fn test_bio_limit_follows_config() {
        let config = Config {
            max_bio_length: 300,
            ..Config::default()
        };
        let users = UserService::new(Arc::new(MemoryStore::new()), &config)
            .await
            .unwrap();
        users
            .get_or_create_profile(&claims("u1", "alice", UserRole::Member))
            .await
            .unwrap();

        let long = users
            .update_profile("u1", UpdateProfileRequest { bio: Some("é".repeat(200)) })
            .await
            .unwrap();
        assert_eq!(long.bio.map(|b| b.chars().count()), Some(200));

        assert!(matches!(
            users
                .update_profile("u1", UpdateProfileRequest { bio: Some("x".repeat(301)) })
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let users = service().await;
        assert!(matches!(
            users.get_profile("ghost").await,
            Err(AppError::NotFound(_))
        ));
    }
}
