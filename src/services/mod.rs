pub mod database;
pub mod memory_store;
pub mod surreal_store;
pub mod auth;
pub mod user;
pub mod follow;
pub mod post;
pub mod feed;
pub mod engagement;
pub mod notification;
pub mod comment;

// 重新导出常用类型
pub use database::{Database, Store};
pub use auth::AuthService;
pub use user::UserService;
pub use follow::FollowService;
pub use post::PostService;
pub use feed::FeedService;
pub use engagement::EngagementService;
pub use notification::NotificationService;
pub use comment::CommentService;
