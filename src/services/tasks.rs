use chrono::{DateTime, Utc};
use validator::Validate;

use crate::models::dashboard::Scope;
use crate::models::task::{Assignee, CreateTaskRequest, NewTask, Task, UpdateTaskRequest};
use crate::models::{TaskId, UserId};
use crate::services::visibility::ArchiveFilter;
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

const MIN_TITLE_CHARS: usize = 3;

impl<S: Store + ?Sized> TaskBoard<S> {
    pub async fn create_task(
        &self,
        request: CreateTaskRequest,
        creator_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Task, ServiceError> {
        request.validate()?;

        let title = request.title.trim().to_string();
        if title.chars().count() < MIN_TITLE_CHARS {
            return Err(ServiceError::ValidationError(format!(
                "Title must have at least {} characters",
                MIN_TITLE_CHARS
            )));
        }

        self.active_user(creator_id).await?;
        let assignee = Assignee::from_parts(request.user_id, request.team_id)?;
        let assignee = self.resolve_assignee(assignee).await?;

        let task = self
            .store
            .insert_task(NewTask {
                title,
                description: request.description.filter(|d| !d.trim().is_empty()),
                priority: request.priority.unwrap_or_default(),
                due_date: request.due_date,
                created_by: creator_id,
                assignee,
                tags: request.tags.filter(|t| !t.trim().is_empty()),
                created_at: now,
            })
            .await?;

        log::info!("Task {} created by user {} for {}", task.id, creator_id, assignee);
        Ok(task)
    }

    /// Applies a partial edit of the descriptive fields. Status and assignee
    /// go through `change_status` and `reassign`.
    pub async fn edit_task(
        &self,
        task_id: TaskId,
        changes: UpdateTaskRequest,
        actor_id: UserId,
    ) -> Result<Task, ServiceError> {
        changes.validate()?;
        self.active_user(actor_id).await?;
        let mut task = self.load_task(task_id).await?;
        if task.archived {
            return Err(ServiceError::TaskArchived(task.id));
        }

        let before = task.clone();
        if let Some(title) = changes.title {
            let title = title.trim().to_string();
            if title.chars().count() < MIN_TITLE_CHARS {
                return Err(ServiceError::ValidationError(format!(
                    "Title must have at least {} characters",
                    MIN_TITLE_CHARS
                )));
            }
            task.title = title;
        }
        if let Some(description) = changes.description {
            task.description = Some(description).filter(|d| !d.trim().is_empty());
        }
        if let Some(priority) = changes.priority {
            task.priority = priority;
        }
        if changes.clear_due_date {
            task.due_date = None;
        } else if let Some(due) = changes.due_date {
            task.due_date = Some(due);
        }
        if let Some(tags) = changes.tags {
            task.tags = Some(tags).filter(|t| !t.trim().is_empty());
        }

        if task == before {
            return Ok(task);
        }
        let task = self.store.update_task(&task).await?;
        log::info!("Task {} edited by user {}", task.id, actor_id);
        Ok(task)
    }

    /// Fetches a task the viewer may open: anything reachable through a scope
    /// their role grants, or a task they created.
    pub async fn get_task(&self, task_id: TaskId, viewer_id: UserId) -> Result<Task, ServiceError> {
        let viewer = self.active_user(viewer_id).await?;
        let task = self.load_task(task_id).await?;
        let filter = self.access_filter(&viewer).await?;

        if filter.matches(&task) {
            Ok(task)
        } else {
            // Hidden tasks look the same as missing ones.
            Err(ServiceError::task_not_found(task_id))
        }
    }

    /// Archived tasks visible to the viewer, most recently completed first.
    pub async fn list_archived(&self, viewer_id: UserId, scope: Scope) -> Result<Vec<Task>, ServiceError> {
        let viewer = self.active_user(viewer_id).await?;
        let filter = self
            .visibility_filter(&viewer, scope)
            .await?
            .with_archived(ArchiveFilter::Only);

        let mut tasks = self.store.find_visible(&filter).await?;
        tasks.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(a.id.cmp(&b.id)));
        Ok(tasks)
    }

    pub async fn tasks_due_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Task>, ServiceError> {
        if from > to {
            return Err(ServiceError::ValidationError(
                "Range start must not be after its end".to_string(),
            ));
        }
        self.store.find_by_due_date_range(from, to).await
    }

    pub async fn overdue_tasks(&self, now: DateTime<Utc>) -> Result<Vec<Task>, ServiceError> {
        self.store.find_overdue(now).await
    }
}
