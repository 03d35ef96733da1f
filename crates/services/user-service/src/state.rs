//! Application state for dependency injection.

use std::sync::Arc;

use crate::service::{AppService, UsersService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UsersService>,
    pub app: Arc<AppService>,
}

impl AppState {
    /// Create new app state.
    pub fn new(users: Arc<dyn UsersService>, app: Arc<AppService>) -> Self {
        Self { users, app }
    }
}
