use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Utc;
use validator::Validate;

use crate::config::AppConfig;
use crate::models::auth::{ApiResponse, ErrorResponse};
use crate::models::comment::{
    Comment, CommentListQuery, CommentReadMark, CreateCommentRequest, UnreadCountResponse,
};
use crate::models::TaskId;
use crate::services::Board;
use crate::utils::auth::viewer_id;
use crate::utils::errors::ServiceError;

/// List the comments of a task and mark them read for the caller
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/comments",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID"),
        ("order" = Option<String>, Query, description = "oldest_first (default) or newest_first")
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = ApiResponse<Vec<Comment>>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_comments(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
    query: web::Query<CommentListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("GET /api/tasks/{}/comments", task_id);

    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let comments = board
        .list_comments(task_id, user_id, query.order, Utc::now())
        .await?;

    log::info!("Retrieved {} comments for task {}", comments.len(), task_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success("Comments retrieved successfully", comments)))
}

/// Post a comment on a task
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/comments",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = ApiResponse<Comment>),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn post_comment(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
    comment_req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("POST /api/tasks/{}/comments", task_id);

    comment_req.validate()?;
    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let comment = board
        .post_comment(task_id, user_id, &comment_req.comment_text, Utc::now())
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::success("Comment created successfully", comment)))
}

/// Number of comments the caller has not read yet
#[utoipa::path(
    get,
    path = "/api/tasks/{id}/comments/unread",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Unread count retrieved successfully", body = ApiResponse<UnreadCountResponse>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_unread_count(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("GET /api/tasks/{}/comments/unread", task_id);

    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let unread = board.unread_count(task_id, user_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Unread count retrieved successfully",
        UnreadCountResponse {
            task_id,
            user_id,
            unread,
        },
    )))
}

/// Mark all comments of a task as read for the caller
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/comments/read",
    tag = "comments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Comments marked as read", body = ApiResponse<CommentReadMark>),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn mark_comments_read(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    path: web::Path<TaskId>,
) -> Result<HttpResponse, ServiceError> {
    let task_id = path.into_inner();
    log::info!("POST /api/tasks/{}/comments/read", task_id);

    let user_id = viewer_id(&auth, &config)?;
    board.get_task(task_id, user_id).await?;
    let mark = board.mark_comments_read(task_id, user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Comments marked as read", mark)))
}

/// Routes nested under `/api/tasks`.
pub fn comment_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/{id}/comments", web::get().to(list_comments))
        .route("/{id}/comments", web::post().to(post_comment))
        .route("/{id}/comments/unread", web::get().to(get_unread_count))
        .route("/{id}/comments/read", web::post().to(mark_comments_read));
}
