pub mod admin;
pub mod comment;
pub mod dashboard;
pub mod health;
pub mod task;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::auth::ErrorResponse;
use crate::models::comment::{Comment, CommentReadMark, CreateCommentRequest, UnreadCountResponse};
use crate::models::dashboard::{Bucket, Dashboard, DashboardStats, DashboardTask, Scope};
use crate::models::task::{
    Assignee, ChangeStatusRequest, CreateTaskRequest, ReassignRequest, Task, TaskPriority, TaskStatus,
    UpdateTaskRequest,
};
use crate::models::user::Role;
use crate::services::maintenance::MaintenanceReport;

pub use admin::admin_config;
pub use dashboard::dashboard_config;
pub use health::health_config;
pub use task::task_config;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Task Dashboard API", description = "Dashboards, status workflow, assignment and unread comments"),
    paths(
        dashboard::get_dashboard,
        task::create_task,
        task::get_task,
        task::update_task,
        task::list_archived,
        task::change_status,
        task::reassign,
        task::archive_task,
        comment::list_comments,
        comment::post_comment,
        comment::get_unread_count,
        comment::mark_comments_read,
        admin::run_maintenance,
    ),
    components(schemas(
        Task, TaskStatus, TaskPriority, Assignee, Role, Scope, Bucket,
        Dashboard, DashboardTask, DashboardStats,
        Comment, CommentReadMark, UnreadCountResponse,
        CreateTaskRequest, UpdateTaskRequest, ChangeStatusRequest, ReassignRequest, CreateCommentRequest,
        MaintenanceReport, ErrorResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "dashboard", description = "Categorized task dashboards"),
        (name = "tasks", description = "Task lifecycle and assignment"),
        (name = "comments", description = "Task comments and unread tracking"),
        (name = "admin", description = "Retention maintenance"),
    )
)]
pub struct ApiDoc;
