//! Agent Poker Server Library
//!
//! Exposes the server components for integration testing.

pub mod actor;
pub mod api;
pub mod auth;
pub mod collusion;
pub mod config;
pub mod db;
pub mod error;
pub mod game;
pub mod sanitize;

use api::rate_limit::RateLimiter;
use api::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

/// Gateway-side request deadline. An in-flight actor call still completes
/// and persists; the client re-reads state before retrying.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Creates the application router with all endpoints
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Agent Poker" }))
        .route("/health", get(|| async { "OK" }))
        .nest(
            "/api",
            api::agents_router()
                .merge(api::tables_router())
                .with_state(state),
        )
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
}

/// Test helper to create an in-memory database and run migrations.
/// A single connection is shared: every pooled connection to `:memory:`
/// would otherwise get its own empty database.
pub async fn create_test_db() -> db::DbPool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("Failed to create in-memory database");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// Test helper to create a fully configured test app. The returned state
/// gives tests direct access to the table manager so they can drive the
/// clock themselves.
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    let pool = create_test_db().await;
    let manager = Arc::new(
        actor::TableManager::load(pool.clone())
            .await
            .expect("Failed to load table manager"),
    );
    let state = Arc::new(AppState {
        pool,
        manager,
        limiter: RateLimiter::new(),
        admin_key: "test_admin_key".to_string(),
    });
    (create_app(state.clone()), state)
}
