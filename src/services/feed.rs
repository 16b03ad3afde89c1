use crate::{
    error::Result,
    models::{
        post::{Post, PostQuery, PostScope},
        response::PaginatedResult,
    },
    services::Database,
};
use tracing::debug;

/// 信息流：关注的作者发布的帖子，按时间倒序
#[derive(Clone)]
pub struct FeedService {
    db: Database,
}

impl FeedService {
    pub async fn new(db: Database) -> Result<Self> {
        Ok(Self { db })
    }

    pub async fn feed(&self, user_id: &str, page: usize, per_page: usize) -> Result<PaginatedResult<Post>> {
        let per_page = per_page.max(1);
        let following = self.db.following_of(user_id).await?;

        // 没有关注任何人时不回退到全站帖子
        if following.is_empty() {
            debug!("User {} follows nobody, feed is empty", user_id);
            return Ok(PaginatedResult::empty(page, per_page));
        }

        debug!(
            "Assembling feed for {} from {} authors (page {})",
            user_id,
            following.len(),
            page
        );

        let query = PostQuery::new(PostScope::Authors(following));
        let offset = PaginatedResult::<Post>::offset(page, per_page);
        let total = self.db.count_posts(&query).await?;
        let posts = self.db.find_posts(&query, offset, per_page).await?;

        Ok(PaginatedResult::new(posts, total, page, per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            follow::Follow,
            post::newest_first,
        },
        services::memory_store::MemoryStore,
    };
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn post(id: &str, author: &str, secs: i64) -> Post {
        let at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
        Post {
            id: id.to_string(),
            author_id: author.to_string(),
            title: id.to_string(),
            body: "body".to_string(),
            tags: vec![],
            created_at: at,
            updated_at: at,
        }
    }

    async fn follow(db: &Database, follower: &str, followee: &str) {
        db.insert_follow(Follow {
            id: format!("{}->{}", follower, followee),
            follower_id: follower.to_string(),
            followee_id: followee.to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    }

    fn setup() -> (FeedService, Database) {
        let db: Database = Arc::new(MemoryStore::new());
        (FeedService { db: db.clone() }, db)
    }

    #[tokio::test]
    async fn test_empty_following_gives_empty_feed() {
        let (feed, db) = setup();
        db.insert_post(&post("p1", "a", 1)).await.unwrap();

        let page = feed.feed("v", 1, 20).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_feed_contains_only_followed_authors() {
        let (feed, db) = setup();
        db.insert_post(&post("p1", "a", 1)).await.unwrap();
        follow(&db, "b", "a").await;

        let ids: Vec<_> = feed.feed("b", 1, 20).await.unwrap().data.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p1".to_string()]);

        // 未关注的作者不出现；自己的帖子也不出现
        db.insert_post(&post("p2", "c", 2)).await.unwrap();
        db.insert_post(&post("p3", "b", 3)).await.unwrap();
        let ids: Vec<_> = feed.feed("b", 1, 20).await.unwrap().data.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p1".to_string()]);
    }

    #[tokio::test]
    async fn test_feed_pages() {
        let (feed, db) = setup();
        follow(&db, "v", "a").await;
        follow(&db, "v", "b").await;
        for i in 0..5 {
            let author = if i % 2 == 0 { "a" } else { "b" };
            db.insert_post(&post(&format!("p{}", i), author, i)).await.unwrap();
        }

        let first = feed.feed("v", 1, 2).await.unwrap();
        assert_eq!(first.total, 5);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_more);
        assert_eq!(first.data[0].id, "p4");

        let last = feed.feed("v", 3, 2).await.unwrap();
        assert_eq!(last.data.len(), 1);
        assert_eq!(last.data[0].id, "p0");
        assert!(!last.has_more);

        let beyond = feed.feed("v", 9, 2).await.unwrap();
        assert!(beyond.data.is_empty());
    }

    proptest! {
        #[test]
        fn feed_pages_concatenate_to_filtered_set(
            posts in prop::collection::vec((0usize..4, 0i64..20), 0..40),
            followed in prop::collection::btree_set(0usize..4, 0..4),
            per_page in 1usize..7,
        ) {
            let (feed, db) = setup();
            let authors = ["a", "b", "c", "d"];

            let mut expected = Vec::new();
            tokio_test::block_on(async {
                for author in &followed {
                    follow(&db, "viewer", authors[*author]).await;
                }
                for (i, (author, secs)) in posts.iter().enumerate() {
                    let p = post(&format!("p{:02}", i), authors[*author], *secs);
                    db.insert_post(&p).await.unwrap();
                    if followed.contains(author) {
                        expected.push(p);
                    }
                }
            });
            expected.sort_by(newest_first);

            let mut collected: Vec<Post> = Vec::new();
            let mut page = 1;
            loop {
                let result = tokio_test::block_on(feed.feed("viewer", page, per_page)).unwrap();
                prop_assert_eq!(result.total, expected.len());
                collected.extend(result.data);
                if !result.has_more {
                    break;
                }
                page += 1;
            }

            prop_assert_eq!(&collected, &expected);
            for pair in collected.windows(2) {
                prop_assert!((pair[0].created_at, &pair[0].id) >= (pair[1].created_at, &pair[1].id));
            }
        }
    }
}
