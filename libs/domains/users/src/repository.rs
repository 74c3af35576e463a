use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{UpdateUser, User};

/// Repository trait for User persistence
///
/// Users are addressed by their business `id`, never by a storage key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// All users in insertion order
    async fn list(&self) -> UserResult<Vec<User>>;

    /// Get a user by ID
    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>>;

    /// One user chosen uniformly at random, `None` when there are none
    async fn get_random(&self) -> UserResult<Option<User>>;

    /// Check if a user with this ID exists
    async fn exists(&self, id: i64) -> UserResult<bool>;

    /// Insert a new user; `Conflict` if the ID is taken
    async fn create(&self, user: User) -> UserResult<User>;

    /// Apply the provided fields and return the updated user
    async fn update(&self, id: i64, input: UpdateUser) -> UserResult<User>;

    /// Remove a user and return what was removed
    async fn delete(&self, id: i64) -> UserResult<User>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository pre-filled with `users`, kept in the given order
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn list(&self) -> UserResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn get_by_id(&self, id: i64) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_random(&self) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.choose(&mut rand::rng()).cloned())
    }

    async fn exists(&self, id: i64) -> UserResult<bool> {
        let users = self.users.read().await;
        Ok(users.iter().any(|u| u.id == id))
    }

    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        // Check and insert under one lock so concurrent creates cannot both win
        if users.iter().any(|u| u.id == user.id) {
            return Err(UserError::Conflict(user.id));
        }

        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, input: UpdateUser) -> UserResult<User> {
        let mut users = self.users.write().await;

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(UserError::NotFound(id))?;

        user.apply_update(input);
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> UserResult<User> {
        let mut users = self.users.write().await;

        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or(UserError::NotFound(id))?;

        Ok(users.remove(index))
    }
}
