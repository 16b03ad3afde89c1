use crate::{
    error::{AppError, Result},
    models::{
        comment::Comment,
        follow::Follow,
        like::Like,
        notification::Notification,
        post::{newest_first, Post, PostQuery},
        user::User,
    },
    services::database::Store,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    follows: HashMap<(String, String), Follow>,
    posts: HashMap<String, Post>,
    likes: HashMap<(String, String), Like>,
    notifications: HashMap<String, Notification>,
    comments: HashMap<String, Comment>,
}

/// 进程内存储，所有表共用一把写锁，检查与写入在同一临界区内完成
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(items: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    items.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl Store for MemoryStore {
    async fn verify_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.tables.read().users.get(id).cloned())
    }

    async fn insert_user_if_absent(&self, user: User) -> Result<User> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.users.get(&user.id) {
            return Ok(existing.clone());
        }

        if tables
            .users
            .values()
            .any(|u| u.username == user.username)
        {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }

        tables.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user.clone();
                Ok(())
            }
            None => Err(AppError::not_found("User")),
        }
    }

    async fn insert_follow(&self, follow: Follow) -> Result<bool> {
        let mut tables = self.tables.write();
        let key = (follow.follower_id.clone(), follow.followee_id.clone());
        if tables.follows.contains_key(&key) {
            return Ok(false);
        }
        tables.follows.insert(key, follow);
        Ok(true)
    }

    async fn delete_follow(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let key = (follower_id.to_string(), followee_id.to_string());
        Ok(self.tables.write().follows.remove(&key).is_some())
    }

    async fn follow_exists(&self, follower_id: &str, followee_id: &str) -> Result<bool> {
        let key = (follower_id.to_string(), followee_id.to_string());
        Ok(self.tables.read().follows.contains_key(&key))
    }

    async fn following_of(&self, user_id: &str) -> Result<Vec<String>> {
        Ok(self
            .tables
            .read()
            .follows
            .values()
            .filter(|f| f.follower_id == user_id)
            .map(|f| f.followee_id.clone())
            .collect())
    }

    async fn count_followers(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .follows
            .values()
            .filter(|f| f.followee_id == user_id)
            .count())
    }

    async fn insert_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.tables.write();
        if tables.posts.contains_key(&post.id) {
            return Err(AppError::conflict("Post id already exists"));
        }
        tables.posts.insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<Post>> {
        Ok(self.tables.read().posts.get(id).cloned())
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.posts.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Post")),
        }
    }

    async fn delete_post_cascade(&self, id: &str) -> Result<()> {
        let mut tables = self.tables.write();
        tables.posts.remove(id);
        tables.likes.retain(|_, like| like.post_id != id);
        tables.comments.retain(|_, comment| comment.post_id != id);
        tables
            .notifications
            .retain(|_, notification| notification.target_post_id != id);
        Ok(())
    }

    async fn find_posts(&self, query: &PostQuery, offset: usize, limit: usize) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .tables
            .read()
            .posts
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        posts.sort_by(newest_first);
        Ok(page(posts, offset, limit))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .posts
            .values()
            .filter(|p| query.matches(p))
            .count())
    }

    async fn record_like(&self, like: Like, notification: Option<Notification>) -> Result<bool> {
        let mut tables = self.tables.write();
        let key = (like.user_id.clone(), like.post_id.clone());
        if tables.likes.contains_key(&key) {
            return Ok(false);
        }
        if !tables.posts.contains_key(&like.post_id) {
            return Err(AppError::not_found("Post"));
        }

        tables.likes.insert(key, like);
        if let Some(notification) = notification {
            tables
                .notifications
                .insert(notification.id.clone(), notification);
        }
        Ok(true)
    }

    async fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let key = (user_id.to_string(), post_id.to_string());
        Ok(self.tables.write().likes.remove(&key).is_some())
    }

    async fn count_likes(&self, post_id: &str) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .likes
            .values()
            .filter(|l| l.post_id == post_id)
            .count())
    }

    async fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool> {
        let key = (user_id.to_string(), post_id.to_string());
        Ok(self.tables.read().likes.contains_key(&key))
    }

    async fn list_notifications(
        &self,
        recipient_id: &str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let mut items: Vec<Notification> = self
            .tables
            .read()
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id && (!unread_only || n.unread))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(page(items, offset, limit))
    }

    async fn count_notifications(&self, recipient_id: &str, unread_only: bool) -> Result<usize> {
        Ok(self
            .tables
            .read()
            .notifications
            .values()
            .filter(|n| n.recipient_id == recipient_id && (!unread_only || n.unread))
            .count())
    }

    async fn mark_notification_read(&self, recipient_id: &str, id: &str) -> Result<bool> {
        let mut tables = self.tables.write();
        match tables.notifications.get_mut(id) {
            Some(n) if n.recipient_id == recipient_id => {
                n.unread = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, recipient_id: &str) -> Result<usize> {
        let mut tables = self.tables.write();
        let mut updated = 0;
        for n in tables.notifications.values_mut() {
            if n.recipient_id == recipient_id && n.unread {
                n.unread = false;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        let mut tables = self.tables.write();
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(AppError::not_found("Post"));
        }
        tables.comments.insert(comment.id.clone(), comment.clone());
        Ok(())
    }

    async fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        Ok(self.tables.read().comments.get(id).cloned())
    }

    async fn update_comment(&self, comment: &Comment) -> Result<()> {
        let mut tables = self.tables.write();
        match tables.comments.get_mut(&comment.id) {
            Some(existing) => {
                *existing = comment.clone();
                Ok(())
            }
            None => Err(AppError::not_found("Comment")),
        }
    }

    async fn delete_comment(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().comments.remove(id).is_some())
    }

    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .tables
            .read()
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(comments)
    }
}
