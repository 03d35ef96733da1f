//! User Service Library
//!
//! Device-keyed user accounts with wallets, sessions and push tokens, served
//! over HTTP. Composition is explicit: `Database` -> `UserStore` ->
//! `UserManager` -> `AppState` -> router.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod infra;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tracing::{info, info_span};

use crate::config::UserServiceConfig;
use crate::infra::Database;
use crate::repository::UserStore;
use crate::routes::create_router;
use crate::service::{AppService, UserManager};
use crate::state::AppState;

/// Wire repository, services and router over an open connection.
pub fn build_app(db: DatabaseConnection, config: &UserServiceConfig) -> Router {
    let log = info_span!("users", service = %config.service.service_name);

    let user_repo = Arc::new(UserStore::new(db));
    let user_service = Arc::new(UserManager::new(user_repo, log));
    let app_service = Arc::new(AppService::new(Arc::new(config.clone())));

    create_router(AppState::new(user_service, app_service))
}

/// Run the HTTP server with the given configuration.
pub async fn run_server(config: UserServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database).await?;

    let app = build_app(db.get_connection(), &config);

    let addr: SocketAddr = config.service.addr().parse()?;
    info!(environment = %config.environment, "User service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(
    config: &UserServiceConfig,
    action: MigrateAction,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}
