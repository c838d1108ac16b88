use chrono::{DateTime, Utc};

use crate::models::comment::NewComment;
use crate::models::task::{Task, TaskStatus};
use crate::models::{TaskId, UserId};
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Only the edges of `TaskStatus::can_transition_to` are accepted.
    Strict,
    /// Any target status is accepted; side effects still apply.
    Permissive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Applies a status change to `task` in place. Returns `None` when the task
/// is already in `to`.
pub fn apply_transition(
    task: &mut Task,
    to: TaskStatus,
    now: DateTime<Utc>,
    policy: TransitionPolicy,
) -> Result<Option<StatusChange>, ServiceError> {
    let from = task.status;
    if from == to {
        return Ok(None);
    }
    if task.archived {
        return Err(ServiceError::TaskArchived(task.id));
    }
    if policy == TransitionPolicy::Strict && !from.can_transition_to(to) {
        return Err(ServiceError::InvalidTransition { from, to });
    }

    task.status = to;
    if to.is_completed() {
        task.completed_at = Some(now);
    } else if from.is_completed() {
        task.completed_at = None;
    }

    Ok(Some(StatusChange { from, to }))
}

/// Marks a terminal task as archived.
pub fn archive(task: &mut Task) -> Result<(), ServiceError> {
    if task.archived {
        return Ok(());
    }
    if !task.status.is_terminal() {
        return Err(ServiceError::NotArchivable(task.id));
    }
    task.archived = true;
    Ok(())
}

impl<S: Store + ?Sized> TaskBoard<S> {
    pub(crate) async fn load_task(&self, task_id: TaskId) -> Result<Task, ServiceError> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(|| ServiceError::task_not_found(task_id))
    }

    /// Appends an audit comment for a change that is already committed. A
    /// failure here is logged, not returned: the change itself stands.
    pub(crate) async fn record_system_comment(&self, task_id: TaskId, text: String, now: DateTime<Utc>) {
        if let Err(e) = self.store.append_comment(NewComment::system(task_id, text, now)).await {
            log::error!("Task {} changed but its audit comment was not saved: {}", task_id, e);
        }
    }

    /// Moves a task to `to` on behalf of `actor_id` and records a system
    /// comment describing the change. Conflicting concurrent writes surface
    /// as `ConcurrentModification`.
    pub async fn change_status(
        &self,
        task_id: TaskId,
        to: TaskStatus,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Task, ServiceError> {
        let actor = self.active_user(actor_id).await?;
        let mut task = self.load_task(task_id).await?;

        let change = match apply_transition(&mut task, to, now, self.policy.transition_policy()) {
            Ok(Some(change)) => change,
            Ok(None) => return Ok(task),
            Err(e) => {
                log::warn!("Rejected status change of task {} to {}: {}", task_id, to, e);
                return Err(e);
            }
        };

        let task = self.store.update_task(&task).await?;
        self.record_system_comment(
            task.id,
            format!(
                "Status changed from {} to {} by {}",
                change.from, change.to, actor.username
            ),
            now,
        )
        .await;

        log::info!(
            "Task {} moved from {} to {} by user {}",
            task.id,
            change.from,
            change.to,
            actor.id
        );
        Ok(task)
    }

    /// Archives a terminal task. Archiving an already archived task is a no-op.
    pub async fn archive_task(
        &self,
        task_id: TaskId,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Task, ServiceError> {
        let actor = self.active_user(actor_id).await?;
        let mut task = self.load_task(task_id).await?;
        if task.archived {
            return Ok(task);
        }

        archive(&mut task)?;
        let task = self.store.update_task(&task).await?;
        self.record_system_comment(task.id, format!("Task archived by {}", actor.username), now)
            .await;

        log::info!("Task {} archived by user {}", task.id, actor.id);
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{Assignee, TaskPriority};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 2, 15, 30, 0).unwrap()
    }

    fn task(status: TaskStatus) -> Task {
        Task {
            id: 11,
            title: "Fix login".to_string(),
            description: None,
            priority: TaskPriority::Alta,
            status,
            due_date: None,
            created_by: 1,
            assignee: Assignee::User(1),
            created_at: now() - Duration::days(1),
            completed_at: None,
            archived: false,
            tags: None,
            version: 0,
        }
    }

    #[test]
    fn completion_stamps_and_reopen_clears() {
        let mut t = task(TaskStatus::EmAndamento);
        apply_transition(&mut t, TaskStatus::Concluida, now(), TransitionPolicy::Strict).unwrap();
        assert_eq!(t.completed_at, Some(now()));

        apply_transition(&mut t, TaskStatus::Pendente, now(), TransitionPolicy::Strict).unwrap();
        assert_eq!(t.completed_at, None);

        let later = now() + Duration::hours(2);
        apply_transition(&mut t, TaskStatus::Concluida, later, TransitionPolicy::Permissive).unwrap();
        assert_eq!(t.completed_at, Some(later));
    }

    #[test]
    fn strict_policy_rejects_skipping_in_progress() {
        let mut t = task(TaskStatus::Pendente);
        let err = apply_transition(&mut t, TaskStatus::Concluida, now(), TransitionPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidTransition {
                from: TaskStatus::Pendente,
                to: TaskStatus::Concluida
            }
        ));
        assert_eq!(t.status, TaskStatus::Pendente);
    }

    #[test]
    fn permissive_policy_accepts_any_target() {
        let mut t = task(TaskStatus::Pendente);
        let change = apply_transition(&mut t, TaskStatus::Concluida, now(), TransitionPolicy::Permissive)
            .unwrap()
            .unwrap();
        assert_eq!(change.from, TaskStatus::Pendente);
        assert_eq!(t.completed_at, Some(now()));
    }

    #[test]
    fn same_status_is_a_no_op() {
        let mut t = task(TaskStatus::Pendente);
        assert_eq!(
            apply_transition(&mut t, TaskStatus::Pendente, now(), TransitionPolicy::Strict).unwrap(),
            None
        );
    }

    #[test]
    fn archival_requires_terminal_status() {
        let mut open = task(TaskStatus::EmAndamento);
        assert!(matches!(archive(&mut open), Err(ServiceError::NotArchivable(11))));
        assert!(!open.archived);

        let mut cancelled = task(TaskStatus::Cancelada);
        archive(&mut cancelled).unwrap();
        assert!(cancelled.archived);
    }

    #[test]
    fn archived_tasks_cannot_change_status() {
        let mut t = task(TaskStatus::Concluida);
        t.archived = true;
        assert!(matches!(
            apply_transition(&mut t, TaskStatus::Pendente, now(), TransitionPolicy::Permissive),
            Err(ServiceError::TaskArchived(11))
        ));
    }
}
