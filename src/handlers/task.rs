use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Utc;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::models::auth::{ApiResponse, ErrorResponse};
use crate::models::dashboard::Scope;
use crate::models::task::{
    Assignee, ChangeStatusRequest, CreateTaskRequest, ReassignRequest, Task, UpdateTaskRequest,
};
use crate::models::TaskId;
use crate::services::Board;
use crate::utils::auth::viewer_id;
use crate::utils::errors::ServiceError;

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveQuery {
    pub scope: Option<Scope>,
}

/// Create a new task
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created successfully", body = ApiResponse<Task>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Assignee not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn create_task(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    task_req: web::Json<CreateTaskRequest>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/tasks - Creating new task: {}", task_req.title);

    let user_id = viewer_id(&auth, &config)?;
    let task = board.create_task(task_req.into_inner(), user_id, Utc::now()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Task created successfully", task)))
}

/// Get a specific task by ID
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task retrieved successfully", body = ApiResponse<Task>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_task(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("GET /api/tasks/{}", task_id);

    let user_id = viewer_id(&auth, &config)?;
    let task = board.get_task(task_id, user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task retrieved successfully", task)))
}

/// List archived tasks visible to the caller
#[utoipa::path(
    get,
    path = "/api/tasks/archived",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("scope" = Option<Scope>, Query, description = "Visibility scope, defaults to the caller's role scope")
    ),
    responses(
        (status = 200, description = "Archived tasks retrieved successfully", body = ApiResponse<Vec<Task>>),
        (status = 403, description = "Scope not allowed for the caller's role", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_archived(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    query: web::Query<ArchiveQuery>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/tasks/archived");

    let user_id = viewer_id(&auth, &config)?;
    let scope = match query.scope {
        Some(scope) => scope,
        None => board.active_user(user_id).await?.role.default_scope(),
    };
    let tasks = board.list_archived(user_id, scope).await?;

    log::info!("Retrieved {} archived tasks", tasks.len());
    Ok(HttpResponse::Ok().json(ApiResponse::success("Archived tasks retrieved successfully", tasks)))
}

/// Change the status of a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/status",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = ChangeStatusRequest,
    responses(
        (status = 200, description = "Status updated successfully", body = ApiResponse<Task>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Transition rejected or concurrent update", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn change_status(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
    status_req: web::Json<ChangeStatusRequest>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("PUT /api/tasks/{}/status - {}", task_id, status_req.status);

    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let task = board
        .change_status(task_id, status_req.status, user_id, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task status updated successfully", task)))
}

/// Reassign a task to a user or a team
#[utoipa::path(
    put,
    path = "/api/tasks/{id}/assignee",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = ReassignRequest,
    responses(
        (status = 200, description = "Task reassigned successfully", body = ApiResponse<Task>),
        (status = 400, description = "Both or neither target supplied", body = ErrorResponse),
        (status = 404, description = "Task, user or team not found", body = ErrorResponse),
        (status = 409, description = "Concurrent update", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn reassign(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
    reassign_req: web::Json<ReassignRequest>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("PUT /api/tasks/{}/assignee", task_id);

    let user_id = viewer_id(&auth, &config)?;
    let target = Assignee::from_parts(reassign_req.user_id, reassign_req.team_id)?;
    board.get_task(task_id, user_id).await?;
    let task = board.reassign(task_id, target, user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task reassigned successfully", task)))
}

/// Edit a task's title, description, priority, due date or tags
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = ApiResponse<Task>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task is archived or was modified concurrently", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn update_task(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
    task_req: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("PUT /api/tasks/{}", task_id);

    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let task = board.edit_task(task_id, task_req.into_inner(), user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task updated successfully", task)))
}

/// Archive a completed or cancelled task
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/archive",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task archived successfully", body = ApiResponse<Task>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task is not in a terminal status", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn archive_task(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("POST /api/tasks/{}/archive", task_id);

    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let task = board.archive_task(task_id, user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Task archived successfully", task)))
}

pub fn task_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tasks")
            .route("", web::post().to(create_task))
            // registered before "/{id}" so it is not parsed as an id
            .route("/archived", web::get().to(list_archived))
            .route("/{id}", web::get().to(get_task))
            .route("/{id}", web::put().to(update_task))
            .route("/{id}/status", web::put().to(change_status))
            .route("/{id}/assignee", web::put().to(reassign))
            .route("/{id}/archive", web::post().to(archive_task))
            .configure(crate::handlers::comment::comment_config),
    );
}
