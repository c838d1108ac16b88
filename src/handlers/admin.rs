use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Utc;

use crate::config::AppConfig;
use crate::models::auth::{ApiResponse, ErrorResponse};
use crate::services::maintenance::MaintenanceReport;
use crate::services::Board;
use crate::utils::auth::viewer_id;
use crate::utils::errors::ServiceError;

/// Apply retention: purge old completed tasks, prune comments and read marks
#[utoipa::path(
    post,
    path = "/api/admin/maintenance",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Maintenance completed", body = ApiResponse<MaintenanceReport>),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn run_maintenance(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/admin/maintenance");

    let user_id = viewer_id(&auth, &config)?;
    let report = board.run_maintenance(user_id, Utc::now()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success("Maintenance completed", report)))
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .route("/maintenance", web::post().to(run_maintenance))
    );
}
