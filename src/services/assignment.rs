use chrono::{DateTime, Utc};

use crate::models::task::{Assignee, Task};
use crate::models::{TaskId, UserId};
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

impl<S: Store + ?Sized> TaskBoard<S> {
    /// Checks that the assignment target exists and is active.
    pub async fn resolve_assignee(&self, target: Assignee) -> Result<Assignee, ServiceError> {
        match target {
            Assignee::User(user_id) => {
                self.active_user(user_id).await?;
            }
            Assignee::Team(team_id) => match self.store.find_team(team_id).await? {
                Some(team) if team.active => {}
                _ => return Err(ServiceError::team_not_found(team_id)),
            },
        }
        Ok(target)
    }

    /// Hands a task to a single user or a team. The assignee is replaced as a
    /// whole in one versioned write, so readers never see both or neither.
    /// Status, dates and comments are left untouched apart from the system
    /// comment recording the move.
    pub async fn reassign(
        &self,
        task_id: TaskId,
        target: Assignee,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Task, ServiceError> {
        let actor = self.active_user(actor_id).await?;
        let target = self.resolve_assignee(target).await?;
        let mut task = self.load_task(task_id).await?;

        if task.assignee == target {
            return Ok(task);
        }
        if task.archived {
            return Err(ServiceError::TaskArchived(task.id));
        }

        let previous = task.assignee;
        task.assignee = target;
        let task = self.store.update_task(&task).await?;

        self.record_system_comment(
            task.id,
            format!("Reassigned from {} to {} by {}", previous, target, actor.username),
            now,
        )
        .await;

        log::info!(
            "Task {} reassigned from {} to {} by user {}",
            task.id,
            previous,
            target,
            actor.id
        );
        Ok(task)
    }
}
