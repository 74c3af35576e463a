//! Users API routes
//!
//! This module wires up the users domain to HTTP routes.

use axum::Router;
use domain_users::{MongoUserRepository, UserResult, UserService, handlers};

use crate::state::AppState;

fn repository(state: &AppState) -> MongoUserRepository {
    MongoUserRepository::with_collection(state.db.clone(), &state.config.collection)
}

/// Ensure the unique index on the user id exists
pub async fn init_indexes(state: &AppState) -> UserResult<()> {
    repository(state).init_indexes().await
}

/// Create users router
pub fn router(state: &AppState) -> Router {
    handlers::router(UserService::new(repository(state)))
}
