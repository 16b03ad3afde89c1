use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

/// like 操作结果；`created` 为 false 表示此前已点赞
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeOutcome {
    pub created: bool,
    pub like_count: usize,
}
