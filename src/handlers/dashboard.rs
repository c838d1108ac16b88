use actix_web::{web, HttpResponse, Result};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Local;

use crate::config::AppConfig;
use crate::models::auth::{ApiResponse, ErrorResponse};
use crate::models::dashboard::{Dashboard, DashboardQuery, Scope};
use crate::models::user::Role;
use crate::services::Board;
use crate::utils::auth::viewer_id;
use crate::utils::errors::ServiceError;

/// Get the caller's task dashboard
///
/// Buckets are evaluated against the server's local clock. Clients are
/// expected to poll every `refresh_interval_secs`.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "dashboard",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("role" = Option<Role>, Query, description = "Role whose dashboard to build, defaults to the caller's role"),
        ("scope" = Option<Scope>, Query, description = "Explicit visibility scope, overrides role")
    ),
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<Dashboard>),
        (status = 403, description = "Role or scope not allowed for the caller", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn get_dashboard(
    auth: BearerAuth,
    board: web::Data<Board>,
    config: web::Data<AppConfig>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/dashboard");

    let user_id = viewer_id(&auth, &config)?;
    let now = Local::now();

    let dashboard = match (query.scope, query.role) {
        (Some(scope), _) => board.get_scoped_dashboard(user_id, scope, &now).await?,
        (None, Some(role)) => board.get_dashboard(user_id, role, &now).await?,
        (None, None) => {
            let role = board.active_user(user_id).await?.role;
            board.get_dashboard(user_id, role, &now).await?
        }
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success("Dashboard retrieved successfully", dashboard)))
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/dashboard", web::get().to(get_dashboard));
}
