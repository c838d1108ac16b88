use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::comment::{Comment, CommentOrder, CommentReadMark, NewComment};
use crate::models::{TaskId, UserId};
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

/// Counts, per task, the comments newer than the user's read mark. Tasks
/// without a mark count every comment. Runs in one pass over `marks` and
/// `comment_times`.
pub fn count_unread(
    task_ids: &[TaskId],
    marks: &[CommentReadMark],
    comment_times: &[(TaskId, DateTime<Utc>)],
) -> HashMap<TaskId, i64> {
    let last_read: HashMap<TaskId, DateTime<Utc>> =
        marks.iter().map(|m| (m.task_id, m.last_read_at)).collect();
    let mut counts: HashMap<TaskId, i64> = task_ids.iter().map(|&id| (id, 0)).collect();

    for (task_id, created_at) in comment_times {
        let unread = last_read
            .get(task_id)
            .map_or(true, |mark| created_at > mark);
        if unread {
            if let Some(count) = counts.get_mut(task_id) {
                *count += 1;
            }
        }
    }
    counts
}

impl<S: Store + ?Sized> TaskBoard<S> {
    pub async fn unread_count(&self, task_id: TaskId, user_id: UserId) -> Result<i64, ServiceError> {
        let mark = self.store.get_read_mark(task_id, user_id).await?;
        self.store
            .count_created_after(task_id, mark.map(|m| m.last_read_at))
            .await
    }

    /// Batch form of `unread_count` used by the dashboard.
    pub async fn unread_counts(
        &self,
        task_ids: &[TaskId],
        user_id: UserId,
    ) -> Result<HashMap<TaskId, i64>, ServiceError> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let marks = self.store.read_marks_for_user(user_id, task_ids).await?;
        let times = self.store.comment_times(task_ids).await?;
        Ok(count_unread(task_ids, &marks, &times))
    }

    /// Moves the read mark forward to `at`. Older timestamps leave it in place.
    pub async fn mark_read(
        &self,
        task_id: TaskId,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<CommentReadMark, ServiceError> {
        self.store.upsert_read_mark(task_id, user_id, at).await
    }

    /// Marks everything on the task as read for the viewer as of `now`.
    pub async fn mark_comments_read(
        &self,
        task_id: TaskId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<CommentReadMark, ServiceError> {
        self.active_user(user_id).await?;
        self.load_task(task_id).await?;
        let mark = self.mark_read(task_id, user_id, now).await?;
        log::info!("User {} read comments of task {}", user_id, task_id);
        Ok(mark)
    }

    /// Opens a task's comment thread, which also marks it read.
    pub async fn list_comments(
        &self,
        task_id: TaskId,
        viewer_id: UserId,
        order: CommentOrder,
        now: DateTime<Utc>,
    ) -> Result<Vec<Comment>, ServiceError> {
        self.active_user(viewer_id).await?;
        self.load_task(task_id).await?;
        let comments = self.store.list_by_task(task_id, order).await?;
        self.mark_read(task_id, viewer_id, now).await?;
        Ok(comments)
    }

    pub async fn post_comment(
        &self,
        task_id: TaskId,
        author_id: UserId,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::ValidationError("Comment text is required".to_string()));
        }
        self.active_user(author_id).await?;
        self.load_task(task_id).await?;

        let comment = self
            .store
            .append_comment(NewComment::from_user(task_id, author_id, text, now))
            .await?;
        log::info!("User {} commented on task {}", author_id, task_id);
        Ok(comment)
    }
}
