pub mod auth;
pub mod comment;
pub mod dashboard;
pub mod task;
pub mod user;

pub type TaskId = i32;
pub type UserId = i32;
pub type TeamId = i32;
pub type CommentId = i32;
