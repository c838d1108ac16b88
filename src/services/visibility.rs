use std::collections::BTreeSet;

use crate::models::dashboard::Scope;
use crate::models::task::{Assignee, Task};
use crate::models::user::{Role, User};
use crate::models::{TaskId, TeamId, UserId};
use crate::services::TaskBoard;
use crate::store::Store;
use crate::utils::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFilter {
    Exclude,
    Only,
    Include,
}

impl ArchiveFilter {
    pub fn matches(&self, archived: bool) -> bool {
        match self {
            ArchiveFilter::Exclude => !archived,
            ArchiveFilter::Only => archived,
            ArchiveFilter::Include => true,
        }
    }

    /// `archived` column value to filter on, `None` for no filter.
    pub fn as_column(&self) -> Option<bool> {
        match self {
            ArchiveFilter::Exclude => Some(false),
            ArchiveFilter::Only => Some(true),
            ArchiveFilter::Include => None,
        }
    }
}

/// A resolved visibility window. A task is visible when any of the
/// populated criteria match it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityFilter {
    pub all: bool,
    pub assigned_user: Option<UserId>,
    pub teams: Vec<TeamId>,
    pub created_by: Option<UserId>,
    pub archived: ArchiveFilter,
}

impl VisibilityFilter {
    pub fn for_scope(
        viewer: UserId,
        scope: Scope,
        member_of: Vec<TeamId>,
        manages: Vec<TeamId>,
    ) -> Self {
        let base = VisibilityFilter {
            all: false,
            assigned_user: None,
            teams: Vec::new(),
            created_by: None,
            archived: ArchiveFilter::Include,
        };

        match scope {
            Scope::SelfOnly => VisibilityFilter {
                assigned_user: Some(viewer),
                ..base
            },
            Scope::Team => VisibilityFilter {
                assigned_user: Some(viewer),
                teams: member_of,
                ..base
            },
            Scope::Managed => VisibilityFilter {
                teams: manages,
                created_by: Some(viewer),
                ..base
            },
            Scope::Global => VisibilityFilter { all: true, ..base },
        }
    }

    /// Everything the viewer may open directly: the union of every scope
    /// their role grants, plus tasks they created.
    pub fn for_access(
        viewer: UserId,
        role: Role,
        member_of: Vec<TeamId>,
        manages: Vec<TeamId>,
    ) -> Self {
        let mut teams = member_of;
        if role.allows(Scope::Managed) {
            for team_id in manages {
                if !teams.contains(&team_id) {
                    teams.push(team_id);
                }
            }
        }
        VisibilityFilter {
            all: role.allows(Scope::Global),
            assigned_user: Some(viewer),
            teams,
            created_by: Some(viewer),
            archived: ArchiveFilter::Include,
        }
    }

    pub fn with_archived(mut self, archived: ArchiveFilter) -> Self {
        self.archived = archived;
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.archived.matches(task.archived) {
            return false;
        }
        if self.all {
            return true;
        }

        let by_assignee = match task.assignee {
            Assignee::User(user_id) => self.assigned_user == Some(user_id),
            Assignee::Team(team_id) => self.teams.contains(&team_id),
        };
        by_assignee || self.created_by == Some(task.created_by)
    }
}

impl<S: Store + ?Sized> TaskBoard<S> {
    /// Builds the filter for `viewer` looking through `scope`. Fails with
    /// `Forbidden` when the viewer's role does not grant the scope.
    pub async fn visibility_filter(
        &self,
        viewer: &User,
        scope: Scope,
    ) -> Result<VisibilityFilter, ServiceError> {
        if !viewer.role.allows(scope) {
            return Err(ServiceError::Forbidden(format!(
                "Role {} cannot view the {:?} scope",
                viewer.role.as_str(),
                scope
            )));
        }

        let member_of = match scope {
            Scope::Team => self.store.teams_of_member(viewer.id).await?,
            _ => Vec::new(),
        };
        let manages = match scope {
            Scope::Managed => self.store.teams_managed_by(viewer.id).await?,
            _ => Vec::new(),
        };

        Ok(VisibilityFilter::for_scope(viewer.id, scope, member_of, manages))
    }

    pub async fn access_filter(&self, viewer: &User) -> Result<VisibilityFilter, ServiceError> {
        let member_of = self.store.teams_of_member(viewer.id).await?;
        let manages = if viewer.role.allows(Scope::Managed) {
            self.store.teams_managed_by(viewer.id).await?
        } else {
            Vec::new()
        };
        Ok(VisibilityFilter::for_access(viewer.id, viewer.role, member_of, manages))
    }

    /// Every task (archived ones included) that the viewer may see in `scope`.
    pub async fn visible_tasks(&self, viewer_id: UserId, scope: Scope) -> Result<Vec<Task>, ServiceError> {
        let viewer = self.active_user(viewer_id).await?;
        let filter = self.visibility_filter(&viewer, scope).await?;
        self.store.find_visible(&filter).await
    }

    pub async fn visible_task_ids(&self, viewer_id: UserId, scope: Scope) -> Result<BTreeSet<TaskId>, ServiceError> {
        Ok(self
            .visible_tasks(viewer_id, scope)
            .await?
            .into_iter()
            .map(|task| task.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{TaskPriority, TaskStatus};
    use chrono::Utc;

    fn task(id: TaskId, created_by: UserId, assignee: Assignee) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: None,
            priority: TaskPriority::Normal,
            status: TaskStatus::Pendente,
            due_date: None,
            created_by,
            assignee,
            created_at: Utc::now(),
            completed_at: None,
            archived: false,
            tags: None,
            version: 0,
        }
    }

    #[test]
    fn self_scope_only_sees_individual_tasks() {
        let filter = VisibilityFilter::for_scope(7, Scope::SelfOnly, vec![1], vec![2]);
        assert!(filter.matches(&task(1, 3, Assignee::User(7))));
        assert!(!filter.matches(&task(2, 7, Assignee::Team(1))));
        assert!(!filter.matches(&task(3, 3, Assignee::User(8))));
    }

    #[test]
    fn team_scope_unions_member_teams_with_own_tasks() {
        let filter = VisibilityFilter::for_scope(7, Scope::Team, vec![1, 4], Vec::new());
        assert!(filter.matches(&task(1, 3, Assignee::User(7))));
        assert!(filter.matches(&task(2, 3, Assignee::Team(4))));
        assert!(!filter.matches(&task(3, 7, Assignee::Team(5))));
    }

    #[test]
    fn managed_scope_unions_managed_teams_with_created_tasks() {
        let filter = VisibilityFilter::for_scope(7, Scope::Managed, Vec::new(), vec![2]);
        assert!(filter.matches(&task(1, 3, Assignee::Team(2))));
        assert!(filter.matches(&task(2, 7, Assignee::User(9))));
        assert!(!filter.matches(&task(3, 3, Assignee::User(7))));
    }

    #[test]
    fn access_unions_every_granted_scope() {
        let manager = VisibilityFilter::for_access(7, Role::Gerente, vec![1], vec![2, 1]);
        assert_eq!(manager.teams, vec![1, 2]);
        assert!(manager.matches(&task(1, 3, Assignee::User(7))));
        assert!(manager.matches(&task(2, 3, Assignee::Team(1))));
        assert!(manager.matches(&task(3, 3, Assignee::Team(2))));
        assert!(manager.matches(&task(4, 7, Assignee::User(9))));
        assert!(!manager.matches(&task(5, 3, Assignee::Team(6))));

        let employee = VisibilityFilter::for_access(7, Role::Funcionario, vec![1], vec![2]);
        assert!(employee.matches(&task(1, 7, Assignee::User(9))));
        assert!(!employee.matches(&task(2, 3, Assignee::Team(2))));

        let admin = VisibilityFilter::for_access(1, Role::Administrador, Vec::new(), Vec::new());
        assert!(admin.matches(&task(1, 3, Assignee::Team(6))));
    }

    #[test]
    fn archive_filter_applies_to_every_scope() {
        let mut archived = task(1, 3, Assignee::User(7));
        archived.status = TaskStatus::Concluida;
        archived.archived = true;

        let global = VisibilityFilter::for_scope(1, Scope::Global, Vec::new(), Vec::new());
        assert!(global.matches(&archived));
        assert!(!global.clone().with_archived(ArchiveFilter::Exclude).matches(&archived));
        assert!(global.with_archived(ArchiveFilter::Only).matches(&archived));
    }
}
