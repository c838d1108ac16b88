use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::dashboard::{Dashboard, DashboardTask, Scope};
use crate::models::task::Task;
use crate::models::user::Role;
use crate::models::{TaskId, UserId};
use crate::services::categorizer::categorize;
use crate::services::visibility::ArchiveFilter;
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

fn attach_unread(tasks: Vec<Task>, unread: &HashMap<TaskId, i64>) -> Vec<DashboardTask> {
    tasks
        .into_iter()
        .map(|task| DashboardTask {
            unread_comments: unread.get(&task.id).copied().unwrap_or(0),
            task,
        })
        .collect()
}

impl<S: Store + ?Sized> TaskBoard<S> {
    /// Dashboard for `viewer_id` acting as `role`. A viewer may ask for the
    /// view of their own role or a lower one.
    pub async fn get_dashboard<Tz: TimeZone>(
        &self,
        viewer_id: UserId,
        role: Role,
        now: &DateTime<Tz>,
    ) -> Result<Dashboard, ServiceError> {
        let viewer = self.active_user(viewer_id).await?;
        if !viewer.role.includes(role) {
            return Err(ServiceError::Forbidden(format!(
                "User {} cannot open the {} dashboard",
                viewer_id,
                role.as_str()
            )));
        }
        self.get_scoped_dashboard(viewer_id, role.default_scope(), now).await
    }

    /// Builds the four buckets and counters for an explicit scope. Any failing
    /// step fails the whole dashboard; unread badges are never zero-filled.
    pub async fn get_scoped_dashboard<Tz: TimeZone>(
        &self,
        viewer_id: UserId,
        scope: Scope,
        now: &DateTime<Tz>,
    ) -> Result<Dashboard, ServiceError> {
        let viewer = self.active_user(viewer_id).await?;
        let filter = self
            .visibility_filter(&viewer, scope)
            .await?
            .with_archived(ArchiveFilter::Exclude);

        let tasks = self.store.find_visible(&filter).await?;
        let task_ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        let unread = self.unread_counts(&task_ids, viewer.id).await?;

        let categorized = categorize(tasks, now);
        let stats = categorized.stats();

        log::info!(
            "Dashboard for user {} ({:?}): {} visible, {} pending, {} today, {} overdue, {} completed",
            viewer.id,
            scope,
            stats.total,
            stats.pending,
            stats.today,
            stats.overdue,
            stats.completed
        );

        Ok(Dashboard {
            scope,
            generated_at: now.with_timezone(&Utc),
            refresh_interval_secs: self.policy.poll_interval_secs,
            pending: attach_unread(categorized.pending, &unread),
            today: attach_unread(categorized.today, &unread),
            overdue: attach_unread(categorized.overdue, &unread),
            completed: attach_unread(categorized.completed, &unread),
            stats,
        })
    }
}
