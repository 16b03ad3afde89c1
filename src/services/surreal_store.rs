use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        comment::Comment,
        follow::Follow,
        like::Like,
        notification::Notification,
        post::{Post, PostQuery, PostScope},
        user::{User, UserRole},
    },
    services::database::Store,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::{
    engine::remote::http::{Client, Http},
    opt::auth::Root,
    sql::Thing,
    Surreal,
};
use tracing::{debug, error, info, warn};

const USER_FIELDS: &str = "meta::id(id) AS id, username, bio, role, created_at";
const POST_FIELDS: &str =
    "meta::id(id) AS id, author_id, title, body, tags, tag_text, created_at, updated_at";
const NOTIFICATION_FIELDS: &str =
    "meta::id(id) AS id, recipient_id, actor_id, verb, target_post_id, created_at, unread";
const COMMENT_FIELDS: &str = "meta::id(id) AS id, post_id, author_id, body, created_at, updated_at";

/// 搜索时标签之间的分隔符
const TAG_TEXT_SEPARATOR: &str = "\n";

/// 帖子已被删除时事务内抛出的错误信息
const MISSING_POST: &str = "post not found";

const SCHEMA: &str = r#"
    DEFINE INDEX user_profile_username ON TABLE user_profile COLUMNS username UNIQUE;
    DEFINE INDEX follow_edge ON TABLE follow COLUMNS follower_id, followee_id UNIQUE;
    DEFINE INDEX post_like_pair ON TABLE post_like COLUMNS user_id, post_id UNIQUE;
    DEFINE INDEX post_author ON TABLE post COLUMNS author_id;
    DEFINE INDEX notification_recipient ON TABLE notification COLUMNS recipient_id;
    DEFINE INDEX comment_post ON TABLE comment COLUMNS post_id;
"#;

/// SurrealDB 存储（HTTP 协议）
///
/// 时间以微秒整数保存，保证 ORDER BY 与内存实现一致；
/// 记录 id 使用业务 id，查询时通过 `meta::id(id)` 还原为字符串。
pub struct SurrealStore {
    db: Surreal<Client>,
}

impl SurrealStore {
    pub async fn connect(config: &Config) -> Result<Self> {
        let url = config.database_url.as_str();
        let address = url
            .strip_prefix("http://")
            .unwrap_or(url)
            .trim_end_matches('/');

        let db = Surreal::new::<Http>(address).await?;
        db.signin(Root {
            username: config.database_username.as_str(),
            password: config.database_password.as_str(),
        })
        .await?;
        db.use_ns(config.database_namespace.as_str())
            .use_db(config.database_name.as_str())
            .await?;

        Ok(Self { db })
    }

    pub async fn define_schema(&self) -> Result<()> {
        self.db.query(SCHEMA).await?.check()?;
        info!("Database schema and unique indexes defined");
        Ok(())
    }

    async fn count(&self, sql: String, bindings: Vec<(&'static str, serde_json::Value)>) -> Result<usize> {
        let mut query = self.db.query(sql);
        for binding in bindings {
            query = query.bind(binding);
        }
        let rows: Vec<CountRow> = query.await?.take(0)?;
        Ok(rows.first().map(|r| r.count.max(0) as usize).unwrap_or(0))
    }
}

fn is_unique_violation(err: &surrealdb::Error) -> bool {
    let msg = err.to_string();
    msg.contains("already contains") || msg.contains("already exists")
}

fn is_missing_post(err: &surrealdb::Error) -> bool {
    err.to_string().contains(MISSING_POST)
}

/// 把写语句包进事务，并先确认 `$post_rid` 指向的帖子仍然存在
fn guarded_by_post(statements: &[&str]) -> String {
    let mut sql = format!(
        "BEGIN TRANSACTION;\nIF !(SELECT VALUE id FROM $post_rid) {{ THROW \"{}\"; }};\n",
        MISSING_POST
    );
    for statement in statements {
        sql.push_str(statement);
        sql.push('\n');
    }
    sql.push_str("COMMIT TRANSACTION;");
    sql
}

fn to_micros(at: &DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(micros: i64) -> DateTime<Utc> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    Utc.timestamp_opt(secs, nanos)
        .single()
        .unwrap_or_default()
}

/// 构造帖子查询的 WHERE 子句与绑定参数
fn post_filter(query: &PostQuery) -> (String, Vec<(&'static str, serde_json::Value)>) {
    let mut clauses = Vec::new();
    let mut bindings: Vec<(&'static str, serde_json::Value)> = Vec::new();

    match &query.scope {
        PostScope::All => {}
        PostScope::Authors(authors) => {
            clauses.push("author_id INSIDE $authors".to_string());
            bindings.push(("authors", serde_json::json!(authors)));
        }
        PostScope::Tag(tag) => {
            clauses.push("tags CONTAINS $tag".to_string());
            bindings.push(("tag", serde_json::json!(tag)));
        }
        PostScope::Search(needle) => {
            clauses.push(
                "(string::lowercase(title) CONTAINS $needle \
                 OR string::lowercase(body) CONTAINS $needle \
                 OR tag_text CONTAINS $needle)"
                    .to_string(),
            );
            bindings.push(("needle", serde_json::json!(needle)));
        }
    }

    if let Some(cursor) = &query.before {
        clauses.push(
            "(created_at < $before_ts OR (created_at = $before_ts AND meta::id(id) < $before_id))"
                .to_string(),
        );
        bindings.push(("before_ts", serde_json::json!(to_micros(&cursor.created_at))));
        bindings.push(("before_id", serde_json::json!(cursor.id)));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    (where_clause, bindings)
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct UserRecord {
    #[serde(default, skip_serializing)]
    id: String,
    username: String,
    bio: Option<String>,
    role: UserRole,
    created_at: i64,
}

impl From<&User> for UserRecord {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            bio: user.bio.clone(),
            role: user.role,
            created_at: to_micros(&user.created_at),
        }
    }
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            username: r.username,
            bio: r.bio,
            role: r.role,
            created_at: from_micros(r.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FollowRecord {
    follower_id: String,
    followee_id: String,
    created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PostRecord {
    #[serde(default, skip_serializing)]
    id: String,
    author_id: String,
    title: String,
    body: String,
    tags: Vec<String>,
    tag_text: String,
    created_at: i64,
    updated_at: i64,
}

impl From<&Post> for PostRecord {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id.clone(),
            author_id: post.author_id.clone(),
            title: post.title.clone(),
            body: post.body.clone(),
            tags: post.tags.clone(),
            tag_text: post.tags.join(TAG_TEXT_SEPARATOR),
            created_at: to_micros(&post.created_at),
            updated_at: to_micros(&post.updated_at),
        }
    }
}

impl From<PostRecord> for Post {
    fn from(r: PostRecord) -> Self {
        Self {
            id: r.id,
            author_id: r.author_id,
            title: r.title,
            body: r.body,
            tags: r.tags,
            created_at: from_micros(r.created_at),
            updated_at: from_micros(r.updated_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LikeRecord {
    user_id: String,
    post_id: String,
    created_at: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct NotificationRecord {
    #[serde(default, skip_serializing)]
    id: String,
    recipient_id: String,
    actor_id: String,
    verb: String,
    target_post_id: String,
    created_at: i64,
    unread: bool,
}

impl From<&Notification> for NotificationRecord {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.clone(),
            recipient_id: n.recipient_id.clone(),
            actor_id: n.actor_id.clone(),
            verb: n.verb.clone(),
            target_post_id: n.target_post_id.clone(),
            created_at: to_micros(&n.created_at),
            unread: n.unread,
        }
    }
}

impl From<NotificationRecord> for Notification {
    fn from(r: NotificationRecord) -> Self {
        Self {
            id: r.id,
            recipient_id: r.recipient_id,
            actor_id: r.actor_id,
            verb: r.verb,
            target_post_id: r.target_post_id,
            created_at: from_micros(r.created_at),
            unread: r.unread,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CommentRecord {
    #[serde(default, skip_serializing)]
    id: String,
    post_id: String,
    author_id: String,
    body: String,
    created_at: i64,
    updated_at: i64,
}

impl From<&Comment> for CommentRecord {
    fn from(c: &Comment) -> Self {
        Self {
            id: c.id.clone(),
            post_id: c.post_id.clone(),
            author_id: c.author_id.clone(),
            body: c.body.clone(),
            created_at: to_micros(&c.created_at),
            updated_at: to_micros(&c.updated_at),
        }
    }
}

impl From<CommentRecord> for Comment {
    fn from(r: CommentRecord) -> Self {
        Self {
            id: r.id,
            post_id: r.post_id,
            author_id: r.author_id,
            body: r.body,
            created_at: from_micros(r.created_at),
            updated_at: from_micros(r.updated_at),
        }
    }
}

#[async_trait]
impl Store for SurrealStore {
    async fn verify_connection(&self) -> Result<()> {
        match self.db.query("INFO FOR DB").await.and_then(|r| r.check()) {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let rows: Vec<UserRecord> = self
            .db
            .query(format!("SELECT {} FROM $rid", USER_FIELDS))
            .bind(("rid", Thing::from(("user_profile", id))))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(User::from))
    }

    async fn insert_user_if_absent(&self, user: User) -> Result<User> {
        if let Some(existing) = self.get_user(&user.id).await? {
            return Ok(existing);
        }

        let result = self
            .db
            .query("CREATE $rid CONTENT $record RETURN NONE")
            .bind(("rid", Thing::from(("user_profile", user.id.as_str()))))
            .bind(("record", UserRecord::from(&user)))
            .await?
            .check();

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                // 并发创建同一用户时，另一请求已写入
                if let Some(existing) = self.get_user(&user.id).await? {
                    return Ok(existing);
                }
                warn!("Username '{}' already taken: {}", user.username, e);
                Err(AppError::Conflict(format!(
                    "Username '{}' is already taken",
                    user.username
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        self.db
            .query("UPDATE $rid CONTENT $record RETURN NONE")
            .bind(("rid", Thing::from(("user_profile", user.id.as_str()))))
            .bind(("record", UserRecord::from(user)))
            .await?
            .check()?;
        Ok(())
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        let record = FollowRecord {
            follower_id: follow.follower_id.clone(),
            followee_id: follow.followee_id.clone(),
            created_at: to_micros(&follow.created_at),
        };

        let result = self
            .db
            .query("CREATE $rid CONTENT $record RETURN NONE")
            .bind(("rid", Thing::from(("follow", follow.id.as_str()))))
            .bind(("record", record))
            .await?
            .check();

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                if is_unique_violation(&e)
                    || self
                        .follow_exists(&follow.follower_id, &follow.followee_id)
                        .await?
                {
                    debug!("Follow edge already present: {}", e);
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let removed: Vec<serde_json::Value> = self
            .db
            .query(
                "DELETE follow WHERE follower_id = $follower_id AND followee_id = $followee_id RETURN BEFORE",
            )
            .bind(("follower_id", follower_id.to_string()))
            .bind(("followee_id", followee_id.to_string()))
            .await?
            .take(0)?;
        Ok(!removed.is_empty())
    }

    async fn follow_exists(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let count = self
            .count(
                "SELECT count() AS count FROM follow \
                 WHERE follower_id = $follower_id AND followee_id = $followee_id GROUP ALL"
                    .to_string(),
                vec![
                    ("follower_id", serde_json::json!(follower_id)),
                    ("followee_id", serde_json::json!(followee_id)),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    async fn following_of(&self, user_id: &str) -> Result<Vec<String>> {
        let ids: Vec<String> = self
            .db
            .query("SELECT VALUE followee_id FROM follow WHERE follower_id = $user_id")
            .bind(("user_id", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(ids)
    }

    async fn count_followers(&self, user_id: &str) -> Result<usize> {
        self.count(
            "SELECT count() AS count FROM follow WHERE followee_id = $user_id GROUP ALL".to_string(),
            vec![("user_id", serde_json::json!(user_id))],
        )
        .await
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        self.db
            .query("CREATE $rid CONTENT $record RETURN NONE")
            .bind(("rid", Thing::from(("post", post.id.as_str()))))
            .bind(("record", PostRecord::from(post)))
            .await?
            .check()?;
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let rows: Vec<PostRecord> = self
            .db
            .query(format!("SELECT {} FROM $rid", POST_FIELDS))
            .bind(("rid", Thing::from(("post", id))))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(Post::from))
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        self.db
            .query("UPDATE $rid CONTENT $record RETURN NONE")
            .bind(("rid", Thing::from(("post", post.id.as_str()))))
            .bind(("record", PostRecord::from(post)))
            .await?
            .check()?;
        Ok(())
    }

    async fn delete_post_cascade(&self, id: &str) -> Result<()> {
        let sql = r#"
            BEGIN TRANSACTION;
            DELETE post_like WHERE post_id = $post_id;
            DELETE comment WHERE post_id = $post_id;
            DELETE notification WHERE target_post_id = $post_id;
            DELETE $rid;
            COMMIT TRANSACTION;
        "#;

        self.db
            .query(sql)
            .bind(("post_id", id.to_string()))
            .bind(("rid", Thing::from(("post", id))))
            .await?
            .check()?;
        Ok(())
    }

    async fn find_posts(&self, query: &PostQuery, offset: usize, limit: usize) -> Result<Vec<Post>> {
        let (where_clause, bindings) = post_filter(query);
        let sql = format!(
            "SELECT {} FROM post {} ORDER BY created_at DESC, id DESC LIMIT $limit START $offset",
            POST_FIELDS, where_clause
        );

        let mut q = self
            .db
            .query(sql)
            .bind(("limit", limit as i64))
            .bind(("offset", offset as i64));
        for binding in bindings {
            q = q.bind(binding);
        }

        let rows: Vec<PostRecord> = q.await?.take(0)?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<usize> {
        let (where_clause, bindings) = post_filter(query);
        self.count(
            format!("SELECT count() AS count FROM post {} GROUP ALL", where_clause),
            bindings,
        )
        .await
    }

    async fn record_like(&self, like: Like, notification: Option<Notification>) -> Result<bool> {
        let mut statements = vec!["CREATE $like_rid CONTENT $like RETURN NONE;"];
        if notification.is_some() {
            statements.push("CREATE $notification_rid CONTENT $notification RETURN NONE;");
        }

        let record = LikeRecord {
            user_id: like.user_id.clone(),
            post_id: like.post_id.clone(),
            created_at: to_micros(&like.created_at),
        };

        let mut q = self
            .db
            .query(guarded_by_post(&statements))
            .bind(("post_rid", Thing::from(("post", like.post_id.as_str()))))
            .bind(("like_rid", Thing::from(("post_like", like.id.as_str()))))
            .bind(("like", record));
        if let Some(n) = &notification {
            q = q
                .bind(("notification_rid", Thing::from(("notification", n.id.as_str()))))
                .bind(("notification", NotificationRecord::from(n)));
        }

        let mut response = q.await?;
        let errors = response.take_errors();
        if errors.is_empty() {
            return Ok(true);
        }

        if errors.values().any(is_missing_post) {
            debug!("Like for post {} rejected: post was deleted", like.post_id);
            return Err(AppError::not_found("Post"));
        }

        // 唯一索引冲突：(user, post) 已存在，整个事务回滚
        if errors.values().any(is_unique_violation)
            || self.has_liked(&like.user_id, &like.post_id).await?
        {
            debug!("Like for post {} by {} already recorded", like.post_id, like.user_id);
            return Ok(false);
        }

        if self.get_post(&like.post_id).await?.is_none() {
            return Err(AppError::not_found("Post"));
        }

        match errors.into_values().next() {
            Some(e) => Err(e.into()),
            None => Ok(true),
        }
    }

    async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let removed: Vec<serde_json::Value> = self
            .db
            .query("DELETE post_like WHERE user_id = $user_id AND post_id = $post_id RETURN BEFORE")
            .bind(("user_id", user_id.to_string()))
            .bind(("post_id", post_id.to_string()))
            .await?
            .take(0)?;
        Ok(!removed.is_empty())
    }

    async fn count_likes(&self, post_id: &str) -> Result<usize> {
        self.count(
            "SELECT count() AS count FROM post_like WHERE post_id = $post_id GROUP ALL".to_string(),
            vec![("post_id", serde_json::json!(post_id))],
        )
        .await
    }

    async fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let count = self
            .count(
                "SELECT count() AS count FROM post_like \
                 WHERE user_id = $user_id AND post_id = $post_id GROUP ALL"
                    .to_string(),
                vec![
                    ("user_id", serde_json::json!(user_id)),
                    ("post_id", serde_json::json!(post_id)),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    async fn list_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let unread_clause = if unread_only { "AND unread = true" } else { "" };
        let sql = format!(
            "SELECT {} FROM notification WHERE recipient_id = $recipient_id {} \
             ORDER BY created_at DESC, id DESC LIMIT $limit START $offset",
            NOTIFICATION_FIELDS, unread_clause
        );

        let rows: Vec<NotificationRecord> = self
            .db
            .query(sql)
            .bind(("recipient_id", recipient_id.to_string()))
            .bind(("limit", limit as i64))
            .bind(("offset", offset as i64))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(Notification::from).collect())
    }

    async fn count_notifications(&self, recipient_id: &str, unread_only: bool) -> Result<usize> {
        let unread_clause = if unread_only { "AND unread = true" } else { "" };
        self.count(
            format!(
                "SELECT count() AS count FROM notification WHERE recipient_id = $recipient_id {} GROUP ALL",
                unread_clause
            ),
            vec![("recipient_id", serde_json::json!(recipient_id))],
        )
        .await
    }

    async fn mark_notification_read(&self, recipient_id: &str, id: &str) -> Result<bool> {
        let updated: Vec<String> = self
            .db
            .query(
                "UPDATE notification SET unread = false \
                 WHERE meta::id(id) = $id AND recipient_id = $recipient_id \
                 RETURN VALUE meta::id(id)",
            )
            .bind(("id", id.to_string()))
            .bind(("recipient_id", recipient_id.to_string()))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }

    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<usize> {
        let updated: Vec<String> = self
            .db
            .query(
                "UPDATE notification SET unread = false \
                 WHERE recipient_id = $recipient_id AND unread = true \
                 RETURN VALUE meta::id(id)",
            )
            .bind(("recipient_id", recipient_id.to_string()))
            .await?
            .take(0)?;
        Ok(updated.len())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut response = self
            .db
            .query(guarded_by_post(&["CREATE $rid CONTENT $record RETURN NONE;"]))
            .bind(("post_rid", Thing::from(("post", comment.post_id.as_str()))))
            .bind(("rid", Thing::from(("comment", comment.id.as_str()))))
            .bind(("record", CommentRecord::from(comment)))
            .await?;

        let errors = response.take_errors();
        if errors.values().any(is_missing_post) {
            debug!("Comment on post {} rejected: post was deleted", comment.post_id);
            return Err(AppError::not_found("Post"));
        }

        match errors.into_values().next() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let rows: Vec<CommentRecord> = self
            .db
            .query(format!("SELECT {} FROM $rid", COMMENT_FIELDS))
            .bind(("rid", Thing::from(("comment", id))))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(Comment::from))
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        self.db
            .query("UPDATE $rid CONTENT $record RETURN NONE")
            .bind(("rid", Thing::from(("comment", comment.id.as_str()))))
            .bind(("record", CommentRecord::from(comment)))
            .await?
            .check()?;
        Ok(())
    }

    async fn delete_comment(&self, id: &str) -> Result<bool> {
        let removed: Vec<serde_json::Value> = self
            .db
            .query("DELETE $rid RETURN BEFORE")
            .bind(("rid", Thing::from(("comment", id))))
            .await?
            .take(0)?;
        Ok(!removed.is_empty())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let rows: Vec<CommentRecord> = self
            .db
            .query(format!(
                "SELECT {} FROM comment WHERE post_id = $post_id ORDER BY created_at ASC, id ASC",
                COMMENT_FIELDS
            ))
            .bind(("post_id", post_id.to_string()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(Comment::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::PostCursor;

    #[test]
    fn test_micros_round_trip() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_000).unwrap();
        assert_eq!(from_micros(to_micros(&at)), at);

        let before_epoch = Utc.timestamp_opt(-5, 250_000_000).unwrap();
        assert_eq!(from_micros(to_micros(&before_epoch)), before_epoch);
    }

    #[test]
    fn test_post_filter_clauses() {
        let (clause, bindings) = post_filter(&PostQuery::new(PostScope::All));
        assert!(clause.is_empty());
        assert!(bindings.is_empty());

        let cursor = PostCursor {
            created_at: Utc.timestamp_opt(10, 0).unwrap(),
            id: "p9".to_string(),
        };
        let query = PostQuery::new(PostScope::Authors(vec!["a".into(), "b".into()]))
            .before(Some(cursor));
        let (clause, bindings) = post_filter(&query);
        assert!(clause.starts_with("WHERE author_id INSIDE $authors AND "));
        assert!(clause.contains("$before_id"));
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[1], ("before_ts", serde_json::json!(10_000_000)));
    }

    #[test]
    fn test_post_record_keeps_tag_text_for_search() {
        let at = Utc.timestamp_opt(10, 0).unwrap();
        let post = Post {
            id: "p1".into(),
            author_id: "a".into(),
            title: "t".into(),
            body: "b".into(),
            tags: vec!["rust".into(), "web-dev".into()],
            created_at: at,
            updated_at: at,
        };
        let record = PostRecord::from(&post);
        assert_eq!(record.tag_text, "rust\nweb-dev");

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(Post::from(record), post);
    }

    #[test]
    fn test_like_and_comment_writes_check_post_first() {
        let sql = guarded_by_post(&[
            "CREATE $like_rid CONTENT $like RETURN NONE;",
            "CREATE $notification_rid CONTENT $notification RETURN NONE;",
        ]);
        let lines: Vec<&str> = sql.lines().collect();
        assert_eq!(lines.first(), Some(&"BEGIN TRANSACTION;"));
        assert_eq!(
            lines[1],
            "IF !(SELECT VALUE id FROM $post_rid) { THROW \"post not found\"; };"
        );
        assert!(lines[2].starts_with("CREATE $like_rid"));
        assert!(lines[3].starts_with("CREATE $notification_rid"));
        assert_eq!(lines.last(), Some(&"COMMIT TRANSACTION;"));
    }

    #[test]
    fn test_thrown_missing_post_is_recognised() {
        let thrown = surrealdb::Error::Db(surrealdb::error::Db::Thrown(MISSING_POST.to_string()));
        assert!(is_missing_post(&thrown));
        assert!(!is_unique_violation(&thrown));

        let other = surrealdb::Error::Db(surrealdb::error::Db::Thrown("boom".to_string()));
        assert!(!is_missing_post(&other));
    }
}
