use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::auth::ErrorResponse;
use crate::models::task::TaskStatus;
use crate::models::TaskId;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },

    #[error("Task {0} is not in a terminal status and cannot be archived")]
    NotArchivable(TaskId),

    #[error("Task {0} is archived")]
    TaskArchived(TaskId),

    #[error("Ambiguous assignment: {0}")]
    AmbiguousAssignment(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Database Error: {0}")]
    DatabaseError(String),

    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl ServiceError {
    pub fn task_not_found(id: TaskId) -> Self {
        ServiceError::NotFound(format!("Task {} not found", id))
    }

    pub fn user_not_found(id: i32) -> Self {
        ServiceError::NotFound(format!("User {} not found or inactive", id))
    }

    pub fn team_not_found(id: i32) -> Self {
        ServiceError::NotFound(format!("Team {} not found or inactive", id))
    }

    fn public_message(&self) -> String {
        match self {
            // Don't expose internal or database details
            ServiceError::InternalError(_) => "Something went wrong".to_string(),
            ServiceError::DatabaseError(_) => "Database operation failed".to_string(),
            ServiceError::Unauthorized(msg)
            | ServiceError::Forbidden(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::ValidationError(msg)
            | ServiceError::AmbiguousAssignment(msg)
            | ServiceError::ConcurrentModification(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidTransition { .. }
            | ServiceError::NotArchivable(_)
            | ServiceError::TaskArchived(_)
            | ServiceError::ConcurrentModification(_) => StatusCode::CONFLICT,
            ServiceError::AmbiguousAssignment(_) | ServiceError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::DatabaseError(_) | ServiceError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            status: "error".to_string(),
            message: self.public_message(),
        })
    }
}

// Convert sqlx errors to ServiceError
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("Record not found".to_string()),
            _ => ServiceError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

// Convert JWT errors to ServiceError
impl From<jsonwebtoken::errors::Error> for ServiceError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ServiceError::Unauthorized(format!("JWT error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_http_statuses() {
        assert_eq!(ServiceError::task_not_found(3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::NotArchivable(3).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServiceError::InvalidTransition {
                from: TaskStatus::Pendente,
                to: TaskStatus::Concluida
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::AmbiguousAssignment("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn database_details_are_hidden() {
        let err = ServiceError::DatabaseError("relation \"tasks\" does not exist".to_string());
        assert_eq!(err.public_message(), "Database operation failed");
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        assert!(matches!(
            ServiceError::from(sqlx::Error::RowNotFound),
            ServiceError::NotFound(_)
        ));
    }
}
