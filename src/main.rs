use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::Context;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use taskboard_be::config::{AppConfig, EnginePolicy};
use taskboard_be::handlers::{self, ApiDoc};
use taskboard_be::store::{HealthCheck, Store};
use taskboard_be::{Board, Database, MemoryStore, TaskBoard};

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let db = Database::new(url).await?;
            db.check_tables().await?;
            let store: Arc<dyn Store> = Arc::new(db);
            Ok(store)
        }
        None => {
            log::warn!("⚠️  DATABASE_URL not set, using the in-memory store");
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            Ok(store)
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let policy = EnginePolicy::from_env().context("Failed to load engine settings")?;

    log::info!("🚀 Starting Task Dashboard API on port {}", config.port);
    log::info!("📋 Allowed frontend URLs: {:?}", config.frontend_urls);
    log::info!(
        "⚙️  Strict status transitions: {}, dashboard poll interval: {}s",
        policy.strict_transitions,
        policy.poll_interval_secs
    );

    let store = open_store(&config).await?;
    store
        .get_stats()
        .await
        .context("Failed to read store statistics")?
        .log_stats();

    let board: Board = TaskBoard::new(store, policy);
    let board = web::Data::new(board);
    let app_config = web::Data::new(config.clone());
    let openapi = ApiDoc::openapi();
    let allowed_origins = config.frontend_urls.clone();
    let is_development = config.is_development();

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                "Authorization",
                "Content-Type",
                "Accept",
                "Origin",
                "X-Requested-With",
            ])
            .supports_credentials();

        // Add allowed origins
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        let mut app = App::new()
            .wrap(cors)
            .wrap(actix_web::middleware::Logger::default())
            .app_data(board.clone())
            .app_data(app_config.clone())
            .configure(handlers::health_config)
            .configure(handlers::dashboard_config)
            .configure(handlers::task_config)
            .configure(handlers::admin_config)
            .route("/", web::get().to(|| async {
                HttpResponse::Ok().json(serde_json::json!({
                    "name": "Task Dashboard API",
                    "version": env!("CARGO_PKG_VERSION"),
                    "description": "Dashboards, status workflow, assignment and unread comments"
                }))
            }));

        if is_development {
            app = app.service(
                SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi.clone()),
            );
        }
        app
    })
    .bind(("0.0.0.0", config.port))
    .with_context(|| format!("Failed to bind port {}", config.port))?
    .run()
    .await
    .context("Server error")
}
