use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>, // 规范化后的 slug，已排序去重
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// 位置游标，用于 keyset 分页
    pub fn cursor(&self) -> PostCursor {
        PostCursor {
            created_at: self.created_at,
            id: self.id.clone(),
        }
    }
}

/// 按 (created_at DESC, id DESC) 排序
pub fn newest_first(a: &Post, b: &Post) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCursor {
    pub created_at: DateTime<Utc>,
    pub id: String,
}

impl PostCursor {
    /// 帖子是否严格位于游标之后（更旧）
    pub fn is_before(&self, post: &Post) -> bool {
        post.created_at < self.created_at
            || (post.created_at == self.created_at && post.id < self.id)
    }
}

/// 帖子查询范围
#[derive(Debug, Clone, PartialEq)]
pub enum PostScope {
    All,
    Authors(Vec<String>),
    Tag(String),
    /// 已转为小写的搜索词
    Search(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    pub scope: PostScope,
    pub before: Option<PostCursor>,
}

impl PostQuery {
    pub fn new(scope: PostScope) -> Self {
        Self { scope, before: None }
    }

    pub fn before(mut self, cursor: Option<PostCursor>) -> Self {
        self.before = cursor;
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        if let Some(cursor) = &self.before {
            if !cursor.is_before(post) {
                return false;
            }
        }

        match &self.scope {
            PostScope::All => true,
            PostScope::Authors(authors) => authors.iter().any(|a| a == &post.author_id),
            PostScope::Tag(tag) => post.tags.iter().any(|t| t == tag),
            PostScope::Search(needle) => {
                post.title.to_lowercase().contains(needle.as_str())
                    || post.body.to_lowercase().contains(needle.as_str())
                    || post.tags.iter().any(|t| t.contains(needle.as_str()))
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1))]
    pub body: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1))]
    pub body: Option<String>,

    pub tags: Option<Vec<String>>,
}

/// 帖子详情，附带点赞信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub like_count: usize,
    pub liked_by_me: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str, secs: i64, tags: &[&str]) -> Post {
        let at = Utc.timestamp_opt(secs, 0).unwrap();
        Post {
            id: id.to_string(),
            author_id: "author".to_string(),
            title: format!("Title {}", id),
            body: "Body about Rust".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_newest_first_breaks_ties_by_id() {
        let mut posts = vec![post("a", 10, &[]), post("c", 20, &[]), post("b", 10, &[])];
        posts.sort_by(newest_first);
        let ids: Vec<_> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_cursor_excludes_itself_and_newer() {
        let anchor = post("m", 10, &[]);
        let cursor = anchor.cursor();
        assert!(!cursor.is_before(&anchor));
        assert!(!cursor.is_before(&post("z", 10, &[])));
        assert!(cursor.is_before(&post("a", 10, &[])));
        assert!(cursor.is_before(&post("z", 9, &[])));
        assert!(!cursor.is_before(&post("a", 11, &[])));
    }

    #[test]
    fn test_search_scope_is_case_insensitive_on_text_and_tags() {
        let p = post("a", 1, &["web-dev"]);
        assert!(PostQuery::new(PostScope::Search("rust".into())).matches(&p));
        assert!(PostQuery::new(PostScope::Search("title a".into())).matches(&p));
        assert!(PostQuery::new(PostScope::Search("web".into())).matches(&p));
        assert!(!PostQuery::new(PostScope::Search("python".into())).matches(&p));
    }
}
