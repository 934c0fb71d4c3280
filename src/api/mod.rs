pub mod agents;
pub mod rate_limit;
pub mod tables;

pub use agents::router as agents_router;
pub use tables::router as tables_router;

use crate::actor::TableManager;
use crate::auth::{bearer_token, hash_api_key};
use crate::db::models::Agent;
use crate::db::{self, DbPool};
use crate::error::{AppError, Result};
use axum::http::HeaderMap;
use rate_limit::RateLimiter;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared state behind every route.
pub struct AppState {
    pub pool: DbPool,
    pub manager: Arc<TableManager>,
    pub limiter: RateLimiter,
    pub admin_key: String,
}

/// Wall-clock epoch milliseconds. The clock is read here at the gateway and
/// flows into the engine as a parameter.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::error!("System clock error: {e}");
            0
        })
}

/// Resolve the bearer token to an agent row, rejecting unknown keys and
/// banned agents.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Agent> {
    let token = bearer_token(headers)?;
    let agent = db::agents::by_api_key_hash(&state.pool, &hash_api_key(token))
        .await?
        .ok_or(AppError::Unauthorized)?;
    if agent.banned {
        return Err(AppError::Forbidden("Account banned".to_string()));
    }
    Ok(agent)
}
