use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::user::Role;
use crate::models::{TaskId, UserId};
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MaintenanceReport {
    pub purged_tasks: Vec<TaskId>,
    pub pruned_comments: u64,
    pub pruned_read_marks: u64,
}

impl<S: Store + ?Sized> TaskBoard<S> {
    /// Applies the configured retention windows. Administrators only.
    pub async fn run_maintenance(
        &self,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<MaintenanceReport, ServiceError> {
        let actor = self.active_user(actor_id).await?;
        if actor.role != Role::Administrador {
            return Err(ServiceError::Forbidden(
                "Only administrators can run retention maintenance".to_string(),
            ));
        }

        let completed_cutoff = now - Duration::days(self.policy.completed_retention_days);
        let read_mark_cutoff = now - Duration::days(self.policy.read_mark_retention_days);

        let purged_tasks = self.store.purge_completed_before(completed_cutoff).await?;
        let pruned_comments = self.store.prune_comments(self.policy.comment_retention).await?;
        let pruned_read_marks = self.store.prune_read_marks(read_mark_cutoff).await?;

        log::info!(
            "Maintenance by user {}: {} tasks purged, {} comments pruned, {} read marks pruned",
            actor.id,
            purged_tasks.len(),
            pruned_comments,
            pruned_read_marks
        );

        Ok(MaintenanceReport {
            purged_tasks,
            pruned_comments,
            pruned_read_marks,
        })
    }
}
