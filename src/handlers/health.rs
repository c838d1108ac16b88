use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::models::auth::ApiResponse;
use crate::services::Board;
use crate::store::{HealthCheck, StoreStats};

pub async fn health_check(board: web::Data<Board>) -> Result<HttpResponse> {
    match board.store().health_check().await {
        Ok(_) => {
            let stats = board.store().get_stats().await.unwrap_or_else(|e| {
                log::warn!("Could not collect store statistics: {}", e);
                StoreStats::default()
            });

            Ok(HttpResponse::Ok().json(ApiResponse::success(
                "Task Dashboard API is running",
                json!({
                    "status": "ok",
                    "store": "connected",
                    "stats": stats
                })
            )))
        }
        Err(e) => {
            log::error!("Store health check failed: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(json!({
                "status": "error",
                "message": "Store connection failed"
            })))
        }
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
