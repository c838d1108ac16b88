//! Persistence contract consumed by the engine.
//!
//! Implementations own atomicity: `update_task` is a compare-and-set on
//! `Task::version`, and `upsert_read_mark` never moves a mark backwards.
//! `MemoryStore` backs tests and database-less runs; `Database` is the
//! PostgreSQL implementation.

pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::comment::{Comment, CommentOrder, CommentReadMark, NewComment};
use crate::models::task::{NewTask, Task};
use crate::models::user::{Team, User};
use crate::models::{TaskId, TeamId, UserId};
use crate::services::visibility::VisibilityFilter;
use crate::utils::errors::ServiceError;

pub use memory::MemoryStore;

pub type StoreResult<T> = Result<T, ServiceError>;

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task>;

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>>;

    async fn find_visible(&self, filter: &VisibilityFilter) -> StoreResult<Vec<Task>>;

    /// Writes `task` if the stored version still equals `task.version` and
    /// returns the stored row with its bumped version. A stale version yields
    /// `ServiceError::ConcurrentModification`.
    async fn update_task(&self, task: &Task) -> StoreResult<Task>;

    /// Non-archived tasks with `from <= due_date < to`.
    async fn find_by_due_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Task>>;

    /// Non-archived, non-terminal tasks with `due_date < before`.
    async fn find_overdue(&self, before: DateTime<Utc>) -> StoreResult<Vec<Task>>;

    /// Hard-deletes completed tasks with `completed_at < cutoff`, along with
    /// their comments and read marks. Returns the purged ids.
    async fn purge_completed_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<TaskId>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn append_comment(&self, comment: NewComment) -> StoreResult<Comment>;

    async fn list_by_task(&self, task_id: TaskId, order: CommentOrder) -> StoreResult<Vec<Comment>>;

    /// Comments on `task_id` created strictly after `after`; all of them when `after` is `None`.
    async fn count_created_after(&self, task_id: TaskId, after: Option<DateTime<Utc>>) -> StoreResult<i64>;

    /// `(task_id, created_at)` of every comment on the given tasks.
    async fn comment_times(&self, task_ids: &[TaskId]) -> StoreResult<Vec<(TaskId, DateTime<Utc>)>>;

    /// Keeps only the newest `keep_latest` comments of each task.
    async fn prune_comments(&self, keep_latest: usize) -> StoreResult<u64>;
}

#[async_trait]
pub trait ReadMarkStore: Send + Sync {
    async fn get_read_mark(&self, task_id: TaskId, user_id: UserId) -> StoreResult<Option<CommentReadMark>>;

    async fn read_marks_for_user(&self, user_id: UserId, task_ids: &[TaskId]) -> StoreResult<Vec<CommentReadMark>>;

    /// Stores `max(existing, at)` and returns the resulting mark.
    async fn upsert_read_mark(&self, task_id: TaskId, user_id: UserId, at: DateTime<Utc>) -> StoreResult<CommentReadMark>;

    async fn prune_read_marks(&self, before: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>>;

    async fn find_team(&self, id: TeamId) -> StoreResult<Option<Team>>;

    async fn teams_of_member(&self, user_id: UserId) -> StoreResult<Vec<TeamId>>;

    async fn teams_managed_by(&self, user_id: UserId) -> StoreResult<Vec<TeamId>>;
}

#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct StoreStats {
    pub users: i64,
    pub teams: i64,
    pub tasks: i64,
    pub comments: i64,
}

impl StoreStats {
    pub fn log_stats(&self) {
        log::info!("📈 Store Statistics:");
        log::info!("   👥 Users: {}", self.users);
        log::info!("   🏢 Teams: {}", self.teams);
        log::info!("   📋 Tasks: {}", self.tasks);
        log::info!("   💬 Comments: {}", self.comments);
    }
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    async fn get_stats(&self) -> StoreResult<StoreStats>;
}

/// Everything the engine needs from persistence.
pub trait Store: TaskStore + CommentStore + ReadMarkStore + Directory + HealthCheck {}

impl<T> Store for T where T: TaskStore + CommentStore + ReadMarkStore + Directory + HealthCheck {}
