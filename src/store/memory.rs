use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::comment::{Comment, CommentOrder, CommentReadMark, NewComment};
use crate::models::task::{NewTask, Task, TaskStatus};
use crate::models::user::{Team, User};
use crate::models::{TaskId, TeamId, UserId};
use crate::services::visibility::VisibilityFilter;
use crate::store::{
    CommentStore, Directory, HealthCheck, ReadMarkStore, StoreResult, StoreStats, TaskStore,
};
use crate::utils::errors::ServiceError;

#[derive(Debug, Default)]
struct MemoryData {
    users: BTreeMap<UserId, User>,
    teams: BTreeMap<TeamId, Team>,
    members: BTreeSet<(TeamId, UserId)>,
    tasks: BTreeMap<TaskId, Task>,
    // Indexed by task so per-task lookups never scan other tasks' threads.
    comments: HashMap<TaskId, Vec<Comment>>,
    read_marks: HashMap<(TaskId, UserId), DateTime<Utc>>,
    next_task_id: TaskId,
    next_comment_id: i32,
}

/// Process-local store guarded by a single `RwLock`. Each trait call takes
/// the lock once, which gives per-call atomicity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: User) {
        self.data.write().await.users.insert(user.id, user);
    }

    pub async fn add_team(&self, team: Team) {
        self.data.write().await.teams.insert(team.id, team);
    }

    pub async fn add_member(&self, team_id: TeamId, user_id: UserId) {
        self.data.write().await.members.insert((team_id, user_id));
    }

    pub async fn remove_member(&self, team_id: TeamId, user_id: UserId) {
        self.data.write().await.members.remove(&(team_id, user_id));
    }

    pub async fn set_user_active(&self, user_id: UserId, active: bool) {
        if let Some(user) = self.data.write().await.users.get_mut(&user_id) {
            user.active = active;
        }
    }
}

fn check_row(task: &Task) -> StoreResult<()> {
    if task.archived && !task.status.is_terminal() {
        return Err(ServiceError::DatabaseError(format!(
            "Task {} would be archived with non-terminal status {}",
            task.id, task.status
        )));
    }
    Ok(())
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: NewTask) -> StoreResult<Task> {
        let mut data = self.data.write().await;
        data.next_task_id += 1;
        let task = Task {
            id: data.next_task_id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: TaskStatus::Pendente,
            due_date: task.due_date,
            created_by: task.created_by,
            assignee: task.assignee,
            created_at: task.created_at,
            completed_at: None,
            archived: false,
            tags: task.tags,
            version: 0,
        };
        data.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        Ok(self.data.read().await.tasks.get(&id).cloned())
    }

    async fn find_visible(&self, filter: &VisibilityFilter) -> StoreResult<Vec<Task>> {
        let data = self.data.read().await;
        Ok(data
            .tasks
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    }

    async fn update_task(&self, task: &Task) -> StoreResult<Task> {
        check_row(task)?;
        let mut data = self.data.write().await;
        let stored = data
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| ServiceError::task_not_found(task.id))?;

        if stored.version != task.version {
            return Err(ServiceError::ConcurrentModification(format!(
                "Task {} was modified concurrently (expected version {}, found {})",
                task.id, task.version, stored.version
            )));
        }

        let created_at = stored.created_at;
        *stored = Task {
            created_at,
            version: task.version + 1,
            ..task.clone()
        };
        Ok(stored.clone())
    }

    async fn find_by_due_date_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        let data = self.data.read().await;
        Ok(data
            .tasks
            .values()
            .filter(|task| !task.archived)
            .filter(|task| matches!(task.due_date, Some(due) if due >= from && due < to))
            .cloned()
            .collect())
    }

    async fn find_overdue(&self, before: DateTime<Utc>) -> StoreResult<Vec<Task>> {
        let data = self.data.read().await;
        Ok(data
            .tasks
            .values()
            .filter(|task| !task.archived && !task.status.is_terminal())
            .filter(|task| matches!(task.due_date, Some(due) if due < before))
            .cloned()
            .collect())
    }

    async fn purge_completed_before(&self, cutoff: DateTime<Utc>) -> StoreResult<Vec<TaskId>> {
        let mut data = self.data.write().await;
        let purged: Vec<TaskId> = data
            .tasks
            .values()
            .filter(|task| task.status.is_completed())
            .filter(|task| matches!(task.completed_at, Some(done) if done < cutoff))
            .map(|task| task.id)
            .collect();

        for id in &purged {
            data.tasks.remove(id);
            data.comments.remove(id);
        }
        let purged_set: HashSet<TaskId> = purged.iter().copied().collect();
        data.read_marks.retain(|(task_id, _), _| !purged_set.contains(task_id));

        Ok(purged)
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn append_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut data = self.data.write().await;
        if !data.tasks.contains_key(&comment.task_id) {
            return Err(ServiceError::task_not_found(comment.task_id));
        }

        data.next_comment_id += 1;
        let comment = Comment {
            id: data.next_comment_id,
            task_id: comment.task_id,
            author_id: comment.author_id,
            comment_text: comment.comment_text,
            is_system_message: comment.is_system_message,
            created_at: comment.created_at,
        };
        data.comments
            .entry(comment.task_id)
            .or_default()
            .push(comment.clone());
        Ok(comment)
    }

    async fn list_by_task(&self, task_id: TaskId, order: CommentOrder) -> StoreResult<Vec<Comment>> {
        let data = self.data.read().await;
        let mut comments = data.comments.get(&task_id).cloned().unwrap_or_default();
        comments.sort_by_key(|c| (c.created_at, c.id));
        if order == CommentOrder::NewestFirst {
            comments.reverse();
        }
        Ok(comments)
    }

    async fn count_created_after(&self, task_id: TaskId, after: Option<DateTime<Utc>>) -> StoreResult<i64> {
        let data = self.data.read().await;
        let count = data
            .comments
            .get(&task_id)
            .map(|comments| {
                comments
                    .iter()
                    .filter(|c| after.map_or(true, |mark| c.created_at > mark))
                    .count()
            })
            .unwrap_or(0);
        Ok(count as i64)
    }

    async fn comment_times(&self, task_ids: &[TaskId]) -> StoreResult<Vec<(TaskId, DateTime<Utc>)>> {
        let data = self.data.read().await;
        let mut times = Vec::new();
        for task_id in task_ids {
            if let Some(comments) = data.comments.get(task_id) {
                times.extend(comments.iter().map(|c| (c.task_id, c.created_at)));
            }
        }
        Ok(times)
    }

    async fn prune_comments(&self, keep_latest: usize) -> StoreResult<u64> {
        let mut data = self.data.write().await;
        let mut pruned = 0u64;
        for comments in data.comments.values_mut() {
            if comments.len() > keep_latest {
                comments.sort_by_key(|c| (c.created_at, c.id));
                let excess = comments.len() - keep_latest;
                comments.drain(..excess);
                pruned += excess as u64;
            }
        }
        Ok(pruned)
    }
}

#[async_trait]
impl ReadMarkStore for MemoryStore {
    async fn get_read_mark(&self, task_id: TaskId, user_id: UserId) -> StoreResult<Option<CommentReadMark>> {
        let data = self.data.read().await;
        Ok(data
            .read_marks
            .get(&(task_id, user_id))
            .map(|&last_read_at| CommentReadMark {
                task_id,
                user_id,
                last_read_at,
            }))
    }

    async fn read_marks_for_user(&self, user_id: UserId, task_ids: &[TaskId]) -> StoreResult<Vec<CommentReadMark>> {
        let data = self.data.read().await;
        Ok(task_ids
            .iter()
            .filter_map(|&task_id| {
                data.read_marks
                    .get(&(task_id, user_id))
                    .map(|&last_read_at| CommentReadMark {
                        task_id,
                        user_id,
                        last_read_at,
                    })
            })
            .collect())
    }

    async fn upsert_read_mark(&self, task_id: TaskId, user_id: UserId, at: DateTime<Utc>) -> StoreResult<CommentReadMark> {
        let mut data = self.data.write().await;
        if !data.tasks.contains_key(&task_id) {
            return Err(ServiceError::task_not_found(task_id));
        }

        let mark = data.read_marks.entry((task_id, user_id)).or_insert(at);
        if at > *mark {
            *mark = at;
        }
        Ok(CommentReadMark {
            task_id,
            user_id,
            last_read_at: *mark,
        })
    }

    async fn prune_read_marks(&self, before: DateTime<Utc>) -> StoreResult<u64> {
        let mut data = self.data.write().await;
        let initial = data.read_marks.len();
        data.read_marks.retain(|_, last_read_at| *last_read_at >= before);
        Ok((initial - data.read_marks.len()) as u64)
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.data.read().await.users.get(&id).cloned())
    }

    async fn find_team(&self, id: TeamId) -> StoreResult<Option<Team>> {
        Ok(self.data.read().await.teams.get(&id).cloned())
    }

    async fn teams_of_member(&self, user_id: UserId) -> StoreResult<Vec<TeamId>> {
        let data = self.data.read().await;
        Ok(data
            .members
            .iter()
            .filter(|(_, member)| *member == user_id)
            .map(|(team_id, _)| *team_id)
            .filter(|team_id| data.teams.get(team_id).map_or(false, |team| team.active))
            .collect())
    }

    async fn teams_managed_by(&self, user_id: UserId) -> StoreResult<Vec<TeamId>> {
        let data = self.data.read().await;
        Ok(data
            .teams
            .values()
            .filter(|team| team.active && team.manager_id == Some(user_id))
            .map(|team| team.id)
            .collect())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get_stats(&self) -> StoreResult<StoreStats> {
        let data = self.data.read().await;
        Ok(StoreStats {
            users: data.users.len() as i64,
            teams: data.teams.len() as i64,
            tasks: data.tasks.len() as i64,
            comments: data.comments.values().map(|c| c.len() as i64).sum(),
        })
    }
}
