pub mod comment;
pub mod follow;
pub mod like;
pub mod notification;
pub mod post;
pub mod response;
pub mod user;
