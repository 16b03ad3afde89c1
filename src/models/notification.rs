use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const VERB_LIKED_POST: &str = "liked your post";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: String,
    pub verb: String,
    pub target_post_id: String,
    pub created_at: DateTime<Utc>,
    pub unread: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}
