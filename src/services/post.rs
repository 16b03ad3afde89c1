use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        post::*,
        response::PaginatedResult,
    },
    services::Database,
    utils::{
        slug::{normalize_tag, normalize_tags},
        validation::{normalize_search_query, validate_max_chars, validate_not_blank},
    },
};
use chrono::{SubsecRound, Utc};
use futures::{
    stream::{self, Stream},
    TryStreamExt,
};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct PostService {
    db: Database,
    config: Config,
}

impl PostService {
    pub async fn new(db: Database, config: &Config) -> Result<Self> {
        Ok(Self {
            db,
            config: config.clone(),
        })
    }

    /// 发布帖子
    pub async fn create_post(&self, author_id: &str, request: CreatePostRequest) -> Result<Post> {
        debug!("Creating post for author: {}", author_id);

        request.validate().map_err(AppError::ValidatorError)?;
        validate_not_blank("title", &request.title)?;
        validate_not_blank("body", &request.body)?;
        validate_max_chars("body", &request.body, self.config.max_post_length)?;

        let now = Utc::now().trunc_subsecs(6);
        let post = Post {
            id: Uuid::new_v4().to_string(),
            author_id: author_id.to_string(),
            title: request.title.trim().to_string(),
            body: request.body,
            tags: normalize_tags(&request.tags),
            created_at: now,
            updated_at: now,
        };

        self.db.insert_post(&post).await?;

        info!("Created post: {} by {}", post.id, author_id);
        Ok(post)
    }

    pub async fn get_post(&self, post_id: &str) -> Result<Post> {
        self.db
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post"))
    }

    /// 帖子详情，附带点赞数以及当前用户是否已点赞
    pub async fn get_post_detail(&self, post_id: &str, viewer_id: Option<&str>) -> Result<PostDetail> {
        let post = self.get_post(post_id).await?;
        let like_count = self.db.count_likes(post_id).await?;
        let liked_by_me = match viewer_id {
            Some(viewer) => self.db.has_liked(viewer, post_id).await?,
            None => false,
        };

        Ok(PostDetail {
            post,
            like_count,
            liked_by_me,
        })
    }

    /// 仅作者可以修改；author_id 与 created_at 不变
    pub async fn update_post(
        &self,
        requester_id: &str,
        post_id: &str,
        request: UpdatePostRequest,
    ) -> Result<Post> {
        debug!("Updating post {} by {}", post_id, requester_id);

        request.validate().map_err(AppError::ValidatorError)?;

        let mut post = self.get_post(post_id).await?;
        if post.author_id != requester_id {
            return Err(AppError::forbidden("Only the author can edit this post"));
        }

        if let Some(title) = request.title {
            validate_not_blank("title", &title)?;
            post.title = title.trim().to_string();
        }
        if let Some(body) = request.body {
            validate_not_blank("body", &body)?;
            validate_max_chars("body", &body, self.config.max_post_length)?;
            post.body = body;
        }
        if let Some(tags) = request.tags {
            post.tags = normalize_tags(&tags);
        }
        post.updated_at = Utc::now().trunc_subsecs(6).max(post.created_at);

        self.db.update_post(&post).await?;

        info!("Updated post: {}", post_id);
        Ok(post)
    }

    /// 删除帖子及其点赞、评论和相关通知
    pub async fn delete_post(&self, requester_id: &str, post_id: &str) -> Result<()> {
        debug!("Deleting post {} by {}", post_id, requester_id);

        let post = self.get_post(post_id).await?;
        if post.author_id != requester_id {
            return Err(AppError::forbidden("Only the author can delete this post"));
        }

        self.db.delete_post_cascade(post_id).await?;

        info!("Deleted post: {}", post_id);
        Ok(())
    }

    pub async fn list_posts(&self, page: usize, per_page: usize) -> Result<PaginatedResult<Post>> {
        self.paginate(PostQuery::new(PostScope::All), page, per_page)
            .await
    }

    /// 按标签列出帖子，每次调用都读取最新数据
    pub async fn posts_by_tag(
        &self,
        tag: &str,
        page: usize,
        per_page: usize,
    ) -> Result<PaginatedResult<Post>> {
        let Some(tag) = normalize_tag(tag) else {
            return Ok(PaginatedResult::empty(page, per_page.max(1)));
        };

        self.paginate(PostQuery::new(PostScope::Tag(tag)), page, per_page)
            .await
    }

    /// 按标签惰性遍历帖子，每批用游标续读
    pub fn tag_stream(&self, tag: &str, batch_size: usize) -> impl Stream<Item = Result<Post>> + Send {
        let tag = normalize_tag(tag);
        let walk = TagWalk {
            db: self.db.clone(),
            exhausted: tag.is_none(),
            tag: tag.unwrap_or_default(),
            cursor: None,
            batch_size: batch_size.max(1),
        };

        stream::try_unfold(walk, TagWalk::next_batch).try_flatten()
    }

    /// 标题、正文或标签包含搜索词（不区分大小写）
    pub async fn search(&self, query: &str, page: usize, per_page: usize) -> Result<PaginatedResult<Post>> {
        debug!("Searching posts: '{}'", query);

        let Some(needle) = normalize_search_query(query) else {
            return Ok(PaginatedResult::empty(page, per_page.max(1)));
        };

        self.paginate(PostQuery::new(PostScope::Search(needle)), page, per_page)
            .await
    }

    async fn paginate(&self, query: PostQuery, page: usize, per_page: usize) -> Result<PaginatedResult<Post>> {
        let per_page = per_page.max(1);
        let offset = PaginatedResult::<Post>::offset(page, per_page);

        let total = self.db.count_posts(&query).await?;
        let posts = self.db.find_posts(&query, offset, per_page).await?;

        Ok(PaginatedResult::new(posts, total, page, per_page))
    }
}

type PostBatch = stream::Iter<std::vec::IntoIter<Result<Post>>>;

struct TagWalk {
    db: Database,
    tag: String,
    cursor: Option<PostCursor>,
    batch_size: usize,
    exhausted: bool,
}

impl TagWalk {
    async fn next_batch(mut self) -> Result<Option<(PostBatch, TagWalk)>> {
        if self.exhausted {
            return Ok(None);
        }

        let query = PostQuery::new(PostScope::Tag(self.tag.clone())).before(self.cursor.take());
        let posts = self.db.find_posts(&query, 0, self.batch_size).await?;
        if posts.is_empty() {
            return Ok(None);
        }

        self.exhausted = posts.len() < self.batch_size;
        self.cursor = posts.last().map(Post::cursor);

        let batch = stream::iter(posts.into_iter().map(Ok).collect::<Vec<_>>());
        Ok(Some((batch, self)))
    }
}
