use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{CommentId, TaskId, UserId};

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    /// `None` for automated messages.
    pub author_id: Option<UserId>,
    pub comment_text: String,
    pub is_system_message: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub task_id: TaskId,
    pub author_id: Option<UserId>,
    pub comment_text: String,
    pub is_system_message: bool,
    pub created_at: DateTime<Utc>,
}

impl NewComment {
    pub fn from_user(task_id: TaskId, author_id: UserId, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        NewComment {
            task_id,
            author_id: Some(author_id),
            comment_text: text.into(),
            is_system_message: false,
            created_at: at,
        }
    }

    pub fn system(task_id: TaskId, text: impl Into<String>, at: DateTime<Utc>) -> Self {
        NewComment {
            task_id,
            author_id: None,
            comment_text: text.into(),
            is_system_message: true,
            created_at: at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct CommentReadMark {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub last_read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommentOrder {
    #[default]
    OldestFirst,
    NewestFirst,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 4000, message = "Comment must be between 1 and 4000 characters"))]
    pub comment_text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    #[serde(default)]
    pub order: CommentOrder,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub task_id: TaskId,
    pub user_id: UserId,
    pub unread: i64,
}
