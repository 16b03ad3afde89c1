use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// 本地用户档案，由令牌中的身份信息镜像而来
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String, // Rainbow-Auth 用户ID
    pub username: String,
    pub bio: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Member,
    Moderator,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Member
    }
}

impl UserRole {
    /// 是否可以处理他人的评论
    pub fn can_moderate(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

/// 简介长度上限由 `MAX_BIO_LENGTH` 配置
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub bio: Option<String>,
}

/// 个人主页视图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfileView {
    #[serde(flatten)]
    pub user: User,
    pub follower_count: usize,
    pub following_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_capabilities() {
        assert!(!UserRole::Member.can_moderate());
        assert!(UserRole::Moderator.can_moderate());
        assert!(UserRole::Admin.can_moderate());
        assert_eq!(UserRole::default(), UserRole::Member);
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&UserRole::Moderator).unwrap(), "\"moderator\"");
        let role: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, UserRole::Admin);
    }
}
