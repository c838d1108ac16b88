mod common;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use common::*;
use taskboard_be::config::{AppConfig, EnginePolicy};
use taskboard_be::handlers::{admin_config, dashboard_config, health_config, task_config};
use taskboard_be::models::user::{Role, User};
use taskboard_be::store::Store;
use taskboard_be::utils::auth::issue_token;
use taskboard_be::{Board, MemoryStore};

const SECRET: &str = "integration-secret";

fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        port: 0,
        jwt_secret: SECRET.to_string(),
        environment: "test".to_string(),
        frontend_urls: vec![],
    }
}

fn bearer(user_id: i32) -> (&'static str, String) {
    let user = User {
        id: user_id,
        username: format!("user{}", user_id),
        email: format!("user{}@example.com", user_id),
        full_name: format!("User {}", user_id),
        role: Role::Funcionario,
        active: true,
    };
    let token = issue_token(&user, SECRET, Utc::now(), Duration::hours(1)).unwrap();
    ("Authorization", format!("Bearer {}", token))
}

async fn shared_board() -> web::Data<Board> {
    let memory = Arc::new(MemoryStore::new());
    seed(&memory).await;
    let store: Arc<dyn Store> = memory;
    web::Data::new(Board::new(store, EnginePolicy::default()))
}

macro_rules! app {
    ($board:expr) => {
        test::init_service(
            App::new()
                .app_data($board.clone())
                .app_data(web::Data::new(test_config()))
                .configure(health_config)
                .configure(dashboard_config)
                .configure(task_config)
                .configure(admin_config),
        )
        .await
    };
}

#[actix_web::test]
async fn requests_without_a_token_are_rejected() {
    let board = shared_board().await;
    let app = app!(board);

    let req = test::TestRequest::get().uri("/api/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/dashboard")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn health_reports_store_stats() {
    let board = shared_board().await;
    let app = app!(board);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["stats"]["users"], 5);
}

#[actix_web::test]
async fn created_task_shows_up_on_the_dashboard() {
    let board = shared_board().await;
    let app = app!(board);

    let req = test::TestRequest::post()
        .uri("/api/tasks")
        .insert_header(bearer(CARLA))
        .set_json(json!({ "title": "Update onboarding guide", "team_id": BACKEND }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let task_id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["status"], "PENDENTE");

    let req = test::TestRequest::get()
        .uri("/api/dashboard")
        .insert_header(bearer(CARLA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    let dashboard = &body["data"];
    assert_eq!(dashboard["scope"], "team");
    assert_eq!(dashboard["stats"]["total"], 1);
    assert_eq!(dashboard["pending"][0]["id"], task_id);
    assert_eq!(dashboard["pending"][0]["unread_comments"], 0);
    assert_eq!(dashboard["refresh_interval_secs"], 30);
}

#[actix_web::test]
async fn dashboard_scope_is_checked_against_the_role() {
    let board = shared_board().await;
    let app = app!(board);

    let req = test::TestRequest::get()
        .uri("/api/dashboard?scope=global")
        .insert_header(bearer(CARLA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/dashboard?scope=self")
        .insert_header(bearer(CARLA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/dashboard?role=GERENTE")
        .insert_header(bearer(MANAGER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["scope"], "managed");
}

#[actix_web::test]
async fn task_lifecycle_over_http() {
    let board = shared_board().await;
    let app = app!(board);

    let task = board
        .create_task(request("Ship release notes", Some(CARLA), None, None), MANAGER, Utc::now())
        .await
        .unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}/assignee", task.id))
        .insert_header(bearer(MANAGER))
        .set_json(json!({ "user_id": DIEGO, "team_id": DESIGN }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/archive", task.id))
        .insert_header(bearer(MANAGER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}/status", task.id))
        .insert_header(bearer(CARLA))
        .set_json(json!({ "status": "CONCLUIDA" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["data"]["completed_at"].is_string());

    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/archive", task.id))
        .insert_header(bearer(MANAGER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/tasks/archived")
        .insert_header(bearer(CARLA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"][0]["id"], task.id);
}

#[actix_web::test]
async fn hidden_tasks_look_missing() {
    let board = shared_board().await;
    let app = app!(board);

    let task = board
        .create_task(request("Design review", None, Some(DESIGN), None), ADMIN, Utc::now())
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(CARLA))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(DIEGO))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn comments_and_unread_counts_over_http() {
    let board = shared_board().await;
    let app = app!(board);

    let task = board
        .create_task(request("Plan sprint", None, Some(BACKEND), None), ADMIN, Utc::now())
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/comments", task.id))
        .insert_header(bearer(MANAGER))
        .set_json(json!({ "comment_text": "Kick-off on Monday" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let unread_uri = format!("/api/tasks/{}/comments/unread", task.id);
    let req = test::TestRequest::get()
        .uri(&unread_uri)
        .insert_header(bearer(CARLA))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["unread"], 1);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}/comments", task.id))
        .insert_header(bearer(CARLA))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"][0]["comment_text"], "Kick-off on Monday");

    let req = test::TestRequest::get()
        .uri(&unread_uri)
        .insert_header(bearer(CARLA))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["unread"], 0);

    let req = test::TestRequest::post()
        .uri(&format!("/api/tasks/{}/comments", task.id))
        .insert_header(bearer(CARLA))
        .set_json(json!({ "comment_text": "" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn maintenance_requires_an_administrator() {
    let board = shared_board().await;
    let app = app!(board);

    let req = test::TestRequest::post()
        .uri("/api/admin/maintenance")
        .insert_header(bearer(MANAGER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/admin/maintenance")
        .insert_header(bearer(ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["purged_tasks"], json!([]));
}

#[actix_web::test]
async fn manager_completes_a_task_assigned_to_them() {
    let board = shared_board().await;
    let app = app!(board);

    let task = board
        .create_task(request("Approve budget", Some(MANAGER), None, None), ADMIN, Utc::now())
        .await
        .unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}", task.id))
        .insert_header(bearer(MANAGER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri(&format!("/api/tasks/{}/status", task.id))
        .insert_header(bearer(MANAGER))
        .set_json(json!({ "status": "CONCLUIDA" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "CONCLUIDA");

    let req = test::TestRequest::get()
        .uri(&format!("/api/tasks/{}/comments/unread", task.id))
        .insert_header(bearer(MANAGER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
