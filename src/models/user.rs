use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::models::dashboard::Scope;
use crate::models::{TeamId, UserId};
use crate::utils::errors::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Funcionario,
    Gerente,
    Administrador,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Funcionario => "FUNCIONARIO",
            Role::Gerente => "GERENTE",
            Role::Administrador => "ADMINISTRADOR",
        }
    }

    /// Scope used for the role's dashboard when the caller does not ask for one.
    pub fn default_scope(&self) -> Scope {
        match self {
            Role::Funcionario => Scope::Team,
            Role::Gerente => Scope::Managed,
            Role::Administrador => Scope::Global,
        }
    }

    pub fn allows(&self, scope: Scope) -> bool {
        match scope {
            Scope::SelfOnly | Scope::Team => true,
            Scope::Managed => matches!(self, Role::Gerente | Role::Administrador),
            Scope::Global => matches!(self, Role::Administrador),
        }
    }

    /// Ordering used when a caller asks for another role's dashboard view.
    fn rank(&self) -> u8 {
        match self {
            Role::Funcionario => 0,
            Role::Gerente => 1,
            Role::Administrador => 2,
        }
    }

    pub fn includes(&self, other: Role) -> bool {
        self.rank() >= other.rank()
    }
}

impl FromStr for Role {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FUNCIONARIO" => Ok(Role::Funcionario),
            "GERENTE" => Ok(Role::Gerente),
            "ADMINISTRADOR" => Ok(Role::Administrador),
            other => Err(ServiceError::ValidationError(format!("Unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub active: bool,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub active: bool,
}

impl TryFrom<UserRow> for User {
    type Error = ServiceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            role: row.role.parse()?,
            active: row.active,
        })
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub description: Option<String>,
    pub manager_id: Option<UserId>,
    pub active: bool,
}
