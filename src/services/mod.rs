//! Task dashboard engine.
//!
//! `TaskBoard` holds no mutable state of its own: every operation reads and
//! writes through the shared store, so one instance can serve any number of
//! concurrent callers. Each component adds an `impl` block in its own module.

pub mod assignment;
pub mod categorizer;
pub mod dashboard;
pub mod maintenance;
pub mod status;
pub mod tasks;
pub mod unread;
pub mod visibility;

use std::sync::Arc;

use crate::config::EnginePolicy;
use crate::models::user::User;
use crate::models::UserId;
use crate::store::Store;
use crate::utils::errors::ServiceError;

/// Engine over a type-erased store, as shared with the HTTP handlers.
pub type Board = TaskBoard<dyn Store>;

pub struct TaskBoard<S: Store + ?Sized> {
    store: Arc<S>,
    policy: EnginePolicy,
}

impl<S: Store + ?Sized> Clone for TaskBoard<S> {
    fn clone(&self) -> Self {
        TaskBoard {
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
        }
    }
}

impl<S: Store + ?Sized> TaskBoard<S> {
    pub fn new(store: Arc<S>, policy: EnginePolicy) -> Self {
        TaskBoard { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Looks up a user that may act on the board.
    pub async fn active_user(&self, id: UserId) -> Result<User, ServiceError> {
        match self.store.find_user(id).await? {
            Some(user) if user.active => Ok(user),
            _ => Err(ServiceError::user_not_found(id)),
        }
    }
}
