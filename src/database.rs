use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::models::comment::{Comment, CommentOrder, CommentReadMark, NewComment};
use crate::models::task::{NewTask, Task, TaskRow};
use crate::models::user::{Team, User, UserRow};
use crate::models::{TaskId, TeamId, UserId};
use crate::services::visibility::VisibilityFilter;
use crate::store::{
    CommentStore, Directory, HealthCheck, ReadMarkStore, StoreResult, StoreStats, TaskStore,
};
use crate::utils::errors::ServiceError;

const TASK_COLUMNS: &str = "id, title, description, priority, status, due_date, created_by, \
     assigned_user_id, assigned_team_id, created_at, completed_at, archived, tags, version";

const COMMENT_COLUMNS: &str = "id, task_id, author_id, comment_text, is_system_message, created_at";

/// PostgreSQL implementation of the store contract. See `schema.sql`.
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        log::info!("🔗 Connecting to database...");

        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to the database")?;

        log::info!("✅ Database connection established");

        Ok(Database { pool })
    }

    pub async fn check_tables(&self) -> Result<()> {
        log::info!("📋 Checking database tables...");

        let tables = sqlx::query(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = 'public'
            AND table_name IN ('users', 'teams', 'team_members', 'tasks', 'comments', 'comment_read_marks')
            ORDER BY table_name
            "#
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to check database tables")?;

        let expected_tables = vec!["comment_read_marks", "comments", "tasks", "team_members", "teams", "users"];
        let found_tables: Vec<String> = tables
            .iter()
            .map(|row| row.get::<String, _>("table_name"))
            .collect();

        log::info!("📊 Found tables: {:?}", found_tables);

        if found_tables.len() == expected_tables.len() {
            log::info!("✅ All required tables exist");
        } else {
            log::warn!("⚠️  Some tables may be missing. Expected: {:?}", expected_tables);
            log::warn!("   Run the schema.sql script against the database if tables are missing");
        }

        Ok(())
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> ServiceError {
    move |e| {
        log::error!("Database error {}: {}", context, e);
        ServiceError::DatabaseError(format!("Failed to {}", context))
    }
}

/// Maps a foreign-key violation on `task_id` to `NotFound`.
fn task_fk_error(task_id: TaskId, context: &'static str) -> impl FnOnce(sqlx::Error) -> ServiceError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_foreign_key_violation() {
                return ServiceError::task_not_found(task_id);
            }
        }
        db_error(context)(e)
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> StoreResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

#[async_trait]
impl TaskStore for Database {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (title, description, priority, status, due_date, created_by, \
             assigned_user_id, assigned_team_id, created_at, tags) \
             VALUES ($1, $2, $3, 'PENDENTE', $4, $5, $6, $7, $8, $9) \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.due_date)
        .bind(task.created_by)
        .bind(task.assignee.user_id())
        .bind(task.assignee.team_id())
        .bind(task.created_at)
        .bind(&task.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create task"))?;

        row.try_into()
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch task"))?;

        row.map(Task::try_from).transpose()
    }

    async fn find_visible(&self, filter: &VisibilityFilter) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks \
             WHERE ($1 OR assigned_user_id = $2 OR assigned_team_id = ANY($3) OR created_by = $4) \
             AND ($5::BOOLEAN IS NULL OR archived = $5) \
             ORDER BY id",
            TASK_COLUMNS
        ))
        .bind(filter.all)
        .bind(filter.assigned_user)
        .bind(filter.teams.clone())
        .bind(filter.created_by)
        .bind(filter.archived.as_column())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch visible tasks"))?;

        into_tasks(rows)
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        // Single statement: the assignee pair and the version bump land together.
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks SET title = $1, description = $2, priority = $3, status = $4, due_date = $5, \
             assigned_user_id = $6, assigned_team_id = $7, completed_at = $8, archived = $9, tags = $10, \
             version = version + 1 \
             WHERE id = $11 AND version = $12 \
             RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.assignee.user_id())
        .bind(task.assignee.team_id())
        .bind(task.completed_at)
        .bind(task.archived)
        .bind(&task.tags)
        .bind(task.id)
        .bind(task.version)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update task"))?;

        match row {
            Some(row) => row.try_into(),
            None => match self.find_task(task.id).await? {
                Some(current) => Err(ServiceError::ConcurrentModification(format!(
                    "Task {} was modified concurrently (expected version {}, found {})",
                    task.id, task.version, current.version
                ))),
                None => Err(ServiceError::task_not_found(task.id)),
            },
        }
    }

    async fn find_by_due_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks \
             WHERE NOT archived AND due_date >= $1 AND due_date < $2 \
             ORDER BY due_date, id",
            TASK_COLUMNS
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch tasks by due date"))?;

        into_tasks(rows)
    }

    async fn find_overdue(&self, before: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks \
             WHERE NOT archived AND due_date < $1 \
             AND status NOT IN ('CONCLUIDA', 'CANCELADA', 'FINALIZADO') \
             ORDER BY due_date, id",
            TASK_COLUMNS
        ))
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch overdue tasks"))?;

        into_tasks(rows)
    }

    async fn purge_completed_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<TaskId>> {
        // comments and comment_read_marks cascade on delete
        sqlx::query_scalar::<_, i32>(
            "DELETE FROM tasks \
             WHERE status IN ('CONCLUIDA', 'FINALIZADO') AND completed_at < $1 \
             RETURNING id",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("purge completed tasks"))
    }
}

#[async_trait]
impl CommentStore for Database {
    async fn append_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let task_id = comment.task_id;
        sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO comments (task_id, author_id, comment_text, is_system_message, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {}",
            COMMENT_COLUMNS
        ))
        .bind(comment.task_id)
        .bind(comment.author_id)
        .bind(&comment.comment_text)
        .bind(comment.is_system_message)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(task_fk_error(task_id, "append comment"))
    }

    async fn list_by_task(&self, task_id: TaskId, order: CommentOrder) -> StoreResult<Vec<Comment>> {
        let direction = match order {
            CommentOrder::OldestFirst => "ASC",
            CommentOrder::NewestFirst => "DESC",
        };

        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {} FROM comments WHERE task_id = $1 ORDER BY created_at {dir}, id {dir}",
            COMMENT_COLUMNS,
            dir = direction
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list comments"))
    }

    async fn count_created_after(&self, task_id: TaskId, after: Option<DateTime<Utc>>) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM comments \
             WHERE task_id = $1 AND ($2::TIMESTAMPTZ IS NULL OR created_at > $2)",
        )
        .bind(task_id)
        .bind(after)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("count comments"))
    }

    async fn comment_times(&self, task_ids: &[TaskId]) -> StoreResult<Vec<(TaskId, DateTime<Utc>)>> {
        sqlx::query_as::<_, (i32, DateTime<Utc>)>(
            "SELECT task_id, created_at FROM comments WHERE task_id = ANY($1)",
        )
        .bind(task_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch comment times"))
    }

    async fn prune_comments(&self, keep_latest: usize) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM comments WHERE id IN (
                SELECT id FROM (
                    SELECT id, ROW_NUMBER() OVER (
                        PARTITION BY task_id ORDER BY created_at DESC, id DESC
                    ) AS rn
                    FROM comments
                ) ranked
                WHERE rn > $1
            )
            "#,
        )
        .bind(keep_latest as i64)
        .execute(&self.pool)
        .await
        .map_err(db_error("prune comments"))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ReadMarkStore for Database {
    async fn get_read_mark(&self, task_id: TaskId, user_id: UserId) -> StoreResult<Option<CommentReadMark>> {
        sqlx::query_as::<_, CommentReadMark>(
            "SELECT task_id, user_id, last_read_at FROM comment_read_marks \
             WHERE task_id = $1 AND user_id = $2",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch read mark"))
    }

    async fn read_marks_for_user(&self, user_id: UserId, task_ids: &[TaskId]) -> StoreResult<Vec<CommentReadMark>> {
        sqlx::query_as::<_, CommentReadMark>(
            "SELECT task_id, user_id, last_read_at FROM comment_read_marks \
             WHERE user_id = $1 AND task_id = ANY($2)",
        )
        .bind(user_id)
        .bind(task_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch read marks"))
    }

    async fn upsert_read_mark(&self, task_id: TaskId, user_id: UserId, at: DateTime<Utc>) -> StoreResult<CommentReadMark> {
        sqlx::query_as::<_, CommentReadMark>(
            "INSERT INTO comment_read_marks (task_id, user_id, last_read_at) VALUES ($1, $2, $3) \
             ON CONFLICT (task_id, user_id) DO UPDATE \
             SET last_read_at = GREATEST(comment_read_marks.last_read_at, EXCLUDED.last_read_at) \
             RETURNING task_id, user_id, last_read_at",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(at)
        .fetch_one(&self.pool)
        .await
        .map_err(task_fk_error(task_id, "upsert read mark"))
    }

    async fn prune_read_marks(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM comment_read_marks WHERE last_read_at < $1")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(db_error("prune read marks"))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl Directory for Database {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, full_name, role, active FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("query user"))?;

        row.map(User::try_from).transpose()
    }

    async fn find_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        sqlx::query_as::<_, Team>(
            "SELECT id, name, description, manager_id, active FROM teams WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("query team"))
    }

    async fn teams_of_member(&self, user_id: UserId) -> StoreResult<Vec<TeamId>> {
        sqlx::query_scalar::<_, i32>(
            "SELECT tm.team_id FROM team_members tm \
             JOIN teams t ON t.id = tm.team_id \
             WHERE tm.user_id = $1 AND t.active",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("query team memberships"))
    }

    async fn teams_managed_by(&self, user_id: UserId) -> StoreResult<Vec<TeamId>> {
        sqlx::query_scalar::<_, i32>("SELECT id FROM teams WHERE manager_id = $1 AND active")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("query managed teams"))
    }
}

#[async_trait]
impl HealthCheck for Database {
    async fn health_check(&self) -> StoreResult<()> {
        log::info!("🔍 Running database health check...");

        let result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("execute health check query"))?;

        if result == 1 {
            log::info!("✅ Database health check passed");
            Ok(())
        } else {
            Err(ServiceError::DatabaseError("Database health check failed".to_string()))
        }
    }

    async fn get_stats(&self) -> StoreResult<StoreStats> {
        let stats = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) as user_count,
                (SELECT COUNT(*) FROM teams) as team_count,
                (SELECT COUNT(*) FROM tasks) as task_count,
                (SELECT COUNT(*) FROM comments) as comment_count
            "#
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("get database statistics"))?;

        Ok(StoreStats {
            users: stats.get::<i64, _>("user_count"),
            teams: stats.get::<i64, _>("team_count"),
            tasks: stats.get::<i64, _>("task_count"),
            comments: stats.get::<i64, _>("comment_count"),
        })
    }
}
