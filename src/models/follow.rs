use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: String,
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowStats {
    pub follower_count: usize,
    pub following_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfollowOutcome {
    pub removed: bool,
}
