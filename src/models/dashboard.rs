use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::task::Task;
use crate::models::user::Role;

/// Visibility window used to resolve which tasks a viewer may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Tasks individually assigned to the viewer.
    #[serde(rename = "self")]
    SelfOnly,
    Team,
    Managed,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Pending,
    Today,
    Overdue,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    /// Visible, non-archived tasks, cancelled ones included.
    pub total: usize,
    pub pending: usize,
    pub today: usize,
    pub overdue: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardTask {
    #[serde(flatten)]
    pub task: Task,
    pub unread_comments: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub scope: Scope,
    pub generated_at: DateTime<Utc>,
    /// How often clients are expected to poll for a fresh dashboard.
    pub refresh_interval_secs: u64,
    pub pending: Vec<DashboardTask>,
    pub today: Vec<DashboardTask>,
    pub overdue: Vec<DashboardTask>,
    pub completed: Vec<DashboardTask>,
    pub stats: DashboardStats,
}

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub role: Option<Role>,
    pub scope: Option<Scope>,
}
