use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{TaskId, TeamId, UserId};
use crate::utils::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pendente,
    EmAndamento,
    Concluida,
    Cancelada,
    /// Legacy completion status, handled like `Concluida`.
    Finalizado,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pendente => "PENDENTE",
            TaskStatus::EmAndamento => "EM_ANDAMENTO",
            TaskStatus::Concluida => "CONCLUIDA",
            TaskStatus::Cancelada => "CANCELADA",
            TaskStatus::Finalizado => "FINALIZADO",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Concluida | TaskStatus::Cancelada | TaskStatus::Finalizado
        )
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Concluida | TaskStatus::Finalizado)
    }

    /// Edges of the workflow graph enforced when strict transitions are on.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        use TaskStatus::*;
        match (self, target) {
            (Pendente, EmAndamento) | (EmAndamento, Concluida) => true,
            (Concluida | Finalizado, Pendente) => true,
            (Cancelada, Pendente) => true,
            (from, Cancelada) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDENTE" => Ok(TaskStatus::Pendente),
            "EM_ANDAMENTO" => Ok(TaskStatus::EmAndamento),
            "CONCLUIDA" => Ok(TaskStatus::Concluida),
            "CANCELADA" => Ok(TaskStatus::Cancelada),
            "FINALIZADO" => Ok(TaskStatus::Finalizado),
            other => Err(ServiceError::ValidationError(format!(
                "Unknown task status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Baixa,
    #[default]
    Normal,
    Alta,
    Urgente,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Baixa => "BAIXA",
            TaskPriority::Normal => "NORMAL",
            TaskPriority::Alta => "ALTA",
            TaskPriority::Urgente => "URGENTE",
        }
    }
}

impl FromStr for TaskPriority {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BAIXA" => Ok(TaskPriority::Baixa),
            "NORMAL" => Ok(TaskPriority::Normal),
            "ALTA" => Ok(TaskPriority::Alta),
            "URGENTE" => Ok(TaskPriority::Urgente),
            other => Err(ServiceError::ValidationError(format!(
                "Unknown task priority '{}'",
                other
            ))),
        }
    }
}

/// Who a task is assigned to. A task always has exactly one assignee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Assignee {
    User(UserId),
    Team(TeamId),
}

impl Assignee {
    /// Builds an assignee from the two nullable columns/fields used at the
    /// storage and transport edges. Exactly one side must be present.
    pub fn from_parts(user_id: Option<UserId>, team_id: Option<TeamId>) -> Result<Self, ServiceError> {
        match (user_id, team_id) {
            (Some(user_id), None) => Ok(Assignee::User(user_id)),
            (None, Some(team_id)) => Ok(Assignee::Team(team_id)),
            (Some(_), Some(_)) => Err(ServiceError::AmbiguousAssignment(
                "both a user and a team were supplied".to_string(),
            )),
            (None, None) => Err(ServiceError::AmbiguousAssignment(
                "neither a user nor a team was supplied".to_string(),
            )),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Assignee::User(id) => Some(*id),
            Assignee::Team(_) => None,
        }
    }

    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            Assignee::Team(id) => Some(*id),
            Assignee::User(_) => None,
        }
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assignee::User(id) => write!(f, "user #{}", id),
            Assignee::Team(id) => write!(f, "team #{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub assignee: Assignee,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub tags: Option<String>,
    /// Bumped on every stored update; used for compare-and-set writes.
    pub version: i32,
}

impl Task {
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Terminal tasks may be archived.
    pub fn is_archivable(&self) -> bool {
        self.status.is_terminal() && !self.archived
    }
}

/// A validated task ready to be inserted by a store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub assignee: Assignee,
    pub tags: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `tasks` table. Enum and assignee parsing happens in the
/// `TryFrom` conversion so the rest of the crate only sees `Task`.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub created_by: i32,
    pub assigned_user_id: Option<i32>,
    pub assigned_team_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub tags: Option<String>,
    pub version: i32,
}

impl TryFrom<TaskRow> for Task {
    type Error = ServiceError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let assignee = Assignee::from_parts(row.assigned_user_id, row.assigned_team_id)
            .map_err(|e| ServiceError::DatabaseError(format!("Task {} has an invalid assignee: {}", row.id, e)))?;

        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            priority: row.priority.parse()?,
            status: row.status.parse()?,
            due_date: row.due_date,
            created_by: row.created_by,
            assignee,
            created_at: row.created_at,
            completed_at: row.completed_at,
            archived: row.archived,
            tags: row.tags,
            version: row.version,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTaskRequest {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub tags: Option<String>,
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
}

/// Partial edit of a task's descriptive fields. Status and assignee have
/// their own endpoints.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 3, max = 255, message = "Title must be between 3 and 255 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    /// Removes the due date; wins over `due_date`.
    #[serde(default)]
    pub clear_due_date: bool,
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeStatusRequest {
    pub status: TaskStatus,
}

/// Exactly one of `user_id` / `team_id` must be set.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReassignRequest {
    pub user_id: Option<UserId>,
    pub team_id: Option<TeamId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_finalizado_counts_as_completed() {
        assert!(TaskStatus::Finalizado.is_terminal());
        assert!(TaskStatus::Finalizado.is_completed());
        assert!(!TaskStatus::Cancelada.is_completed());
        assert_eq!("finalizado".parse::<TaskStatus>().unwrap(), TaskStatus::Finalizado);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("DONE".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn workflow_graph_edges() {
        use TaskStatus::*;
        assert!(Pendente.can_transition_to(EmAndamento));
        assert!(EmAndamento.can_transition_to(Concluida));
        assert!(Concluida.can_transition_to(Pendente));
        assert!(Cancelada.can_transition_to(Pendente));
        assert!(Pendente.can_transition_to(Cancelada));
        assert!(EmAndamento.can_transition_to(Cancelada));

        assert!(!Pendente.can_transition_to(Concluida));
        assert!(!Concluida.can_transition_to(Cancelada));
        assert!(!Cancelada.can_transition_to(Concluida));
        assert!(!EmAndamento.can_transition_to(Pendente));
    }

    #[test]
    fn assignee_requires_exactly_one_side() {
        assert_eq!(Assignee::from_parts(Some(4), None).unwrap(), Assignee::User(4));
        assert_eq!(Assignee::from_parts(None, Some(9)).unwrap(), Assignee::Team(9));
        assert!(matches!(
            Assignee::from_parts(Some(4), Some(9)),
            Err(ServiceError::AmbiguousAssignment(_))
        ));
        assert!(matches!(
            Assignee::from_parts(None, None),
            Err(ServiceError::AmbiguousAssignment(_))
        ));
    }

    #[test]
    fn tags_are_split_and_trimmed() {
        let task = Task {
            id: 1,
            title: "Write docs".to_string(),
            description: None,
            priority: TaskPriority::Normal,
            status: TaskStatus::Pendente,
            due_date: None,
            created_by: 1,
            assignee: Assignee::User(1),
            created_at: Utc::now(),
            completed_at: None,
            archived: false,
            tags: Some(" backend, ,urgent ".to_string()),
            version: 0,
        };
        assert_eq!(task.tag_list(), vec!["backend", "urgent"]);
    }
}
