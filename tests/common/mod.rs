#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use taskboard_be::config::EnginePolicy;
use taskboard_be::models::task::{CreateTaskRequest, Task, TaskPriority};
use taskboard_be::models::user::{Role, Team, User};
use taskboard_be::models::{TeamId, UserId};
use taskboard_be::{MemoryStore, TaskBoard};

pub const ADMIN: UserId = 1;
pub const MANAGER: UserId = 2;
pub const CARLA: UserId = 3;
pub const DIEGO: UserId = 4;
pub const INACTIVE_USER: UserId = 5;

/// Managed by MANAGER, CARLA is a member.
pub const BACKEND: TeamId = 10;
/// Managed by MANAGER, DIEGO is a member.
pub const DESIGN: TeamId = 20;
pub const RETIRED_TEAM: TeamId = 30;

pub fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 10, 12, 0, 0).unwrap()
}

fn user(id: UserId, username: &str, role: Role, active: bool) -> User {
    User {
        id,
        username: username.to_string(),
        email: format!("{}@example.com", username),
        full_name: username.to_uppercase(),
        role,
        active,
    }
}

fn team(id: TeamId, name: &str, manager_id: Option<UserId>, active: bool) -> Team {
    Team {
        id,
        name: name.to_string(),
        description: None,
        manager_id,
        active,
    }
}

pub async fn seed(store: &MemoryStore) {
    store.add_user(user(ADMIN, "ana", Role::Administrador, true)).await;
    store.add_user(user(MANAGER, "bruno", Role::Gerente, true)).await;
    store.add_user(user(CARLA, "carla", Role::Funcionario, true)).await;
    store.add_user(user(DIEGO, "diego", Role::Funcionario, true)).await;
    store.add_user(user(INACTIVE_USER, "eva", Role::Funcionario, false)).await;

    store.add_team(team(BACKEND, "Backend", Some(MANAGER), true)).await;
    store.add_team(team(DESIGN, "Design", Some(MANAGER), true)).await;
    store.add_team(team(RETIRED_TEAM, "Retired", None, false)).await;

    store.add_member(BACKEND, CARLA).await;
    store.add_member(DESIGN, DIEGO).await;
}

pub async fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    seed(&store).await;
    store
}

pub async fn board_with(policy: EnginePolicy) -> TaskBoard<MemoryStore> {
    TaskBoard::new(seeded_store().await, policy)
}

pub async fn board() -> TaskBoard<MemoryStore> {
    board_with(EnginePolicy::default()).await
}

pub fn request(title: &str, user_id: Option<UserId>, team_id: Option<TeamId>, due: Option<DateTime<Utc>>) -> CreateTaskRequest {
    CreateTaskRequest {
        title: title.to_string(),
        description: None,
        priority: Some(TaskPriority::Normal),
        due_date: due,
        tags: None,
        user_id,
        team_id,
    }
}

pub async fn create_for_user(board: &TaskBoard<MemoryStore>, creator: UserId, owner: UserId, due: Option<DateTime<Utc>>) -> Task {
    board
        .create_task(request("Prepare report", Some(owner), None, due), creator, noon())
        .await
        .unwrap()
}

pub async fn create_for_team(board: &TaskBoard<MemoryStore>, creator: UserId, team: TeamId, due: Option<DateTime<Utc>>) -> Task {
    board
        .create_task(request("Review designs", None, Some(team), due), creator, noon())
        .await
        .unwrap()
}

pub fn ids(tasks: &[taskboard_be::models::dashboard::DashboardTask]) -> Vec<i32> {
    tasks.iter().map(|t| t.task.id).collect()
}
