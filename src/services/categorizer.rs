//! Splits tasks into the four dashboard buckets.
//!
//! Precedence for a non-archived task:
//! 1. completed status (CONCLUIDA / FINALIZADO) -> `Completed`, whatever the due date;
//! 2. cancelled -> no bucket;
//! 3. due on the evaluating clock's calendar day -> `Today`, even if the time has passed;
//! 4. due before `now` -> `Overdue`;
//! 5. anything else -> `Pending`.

use std::cmp::Reverse;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::dashboard::{Bucket, DashboardStats};
use crate::models::task::Task;

pub fn classify<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<Bucket> {
    if task.archived {
        return None;
    }
    if task.status.is_completed() {
        return Some(Bucket::Completed);
    }
    if task.status.is_terminal() {
        return None;
    }

    let bucket = match task.due_date {
        None => Bucket::Pending,
        Some(due) => {
            let due_day = due.with_timezone(&now.timezone()).date_naive();
            if due_day == now.date_naive() {
                Bucket::Today
            } else if due < now.with_timezone(&Utc) {
                Bucket::Overdue
            } else {
                Bucket::Pending
            }
        }
    };
    Some(bucket)
}

#[derive(Debug, Clone, Default)]
pub struct Categorized {
    pub pending: Vec<Task>,
    pub today: Vec<Task>,
    pub overdue: Vec<Task>,
    pub completed: Vec<Task>,
    /// Non-archived tasks seen, including cancelled ones that land in no bucket.
    pub total: usize,
}

impl Categorized {
    pub fn stats(&self) -> DashboardStats {
        DashboardStats {
            total: self.total,
            pending: self.pending.len(),
            today: self.today.len(),
            overdue: self.overdue.len(),
            completed: self.completed.len(),
        }
    }

    pub fn bucket(&self, bucket: Bucket) -> &[Task] {
        match bucket {
            Bucket::Pending => &self.pending,
            Bucket::Today => &self.today,
            Bucket::Overdue => &self.overdue,
            Bucket::Completed => &self.completed,
        }
    }
}

/// Partitions the non-archived tasks. Open buckets are ordered by due date
/// (undated last), then priority; completed tasks by most recent completion.
pub fn categorize<Tz: TimeZone>(tasks: Vec<Task>, now: &DateTime<Tz>) -> Categorized {
    let mut out = Categorized::default();

    for task in tasks {
        if task.archived {
            continue;
        }
        out.total += 1;
        match classify(&task, now) {
            Some(Bucket::Pending) => out.pending.push(task),
            Some(Bucket::Today) => out.today.push(task),
            Some(Bucket::Overdue) => out.overdue.push(task),
            Some(Bucket::Completed) => out.completed.push(task),
            None => {}
        }
    }

    for open in [&mut out.pending, &mut out.today, &mut out.overdue] {
        open.sort_by_key(|t| (t.due_date.is_none(), t.due_date, Reverse(t.priority), t.id));
    }
    out.completed
        .sort_by_key(|t| (Reverse(t.completed_at), t.id));

    out
}
