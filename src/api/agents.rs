//! Agent-facing routes outside the table: registration, profile, rebuy,
//! and the public leaderboard / stats / collusion surfaces.

use super::rate_limit::{
    client_ip, RateHeaders, AUTHED_PER_MIN, PUBLIC_PER_MIN, REGISTER_PER_MIN,
};
use super::{authenticate, now_ms, AppState};
use crate::auth::{generate_api_key, hash_api_key};
use crate::collusion::WATCHLIST_THRESHOLD;
use crate::db::models::Agent;
use crate::db;
use crate::error::{AppError, Result};
use crate::game::constants::{MAX_REBUYS, REBUY_THRESHOLD, STARTING_CHIPS};
use crate::sanitize::sanitize_name;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/me", get(me))
        .route("/rebuy", post(rebuy))
        .route("/leaderboard", get(leaderboard))
        .route("/stats", get(stats))
        .route("/collusion", get(collusion))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub ok: bool,
    pub agent_id: String,
    pub api_key: String,
    pub chips: i64,
    pub message: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(RateHeaders, Json<RegisterResponse>)> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    let rate = state
        .limiter
        .check(&format!("register:{ip}"), REGISTER_PER_MIN, now_ms())?;

    let name = sanitize_name(&req.name).ok_or_else(|| {
        AppError::Validation(
            "Name must be 2-20 characters of letters, digits, _ or -".to_string(),
        )
    })?;

    let api_key = generate_api_key();
    let agent = Agent::new(
        name,
        hash_api_key(&api_key),
        STARTING_CHIPS,
        req.llm_provider,
        req.llm_model,
    );
    // A duplicate name loses on the UNIQUE index and surfaces as 409, so
    // concurrent registrations of the same name admit exactly one.
    db::agents::insert(&state.pool, &agent).await?;
    tracing::info!("Registered agent {} ({})", agent.name, agent.id);

    Ok((
        rate,
        Json(RegisterResponse {
            ok: true,
            agent_id: agent.id,
            api_key,
            chips: agent.chips,
            message: "Save your API key now; it is shown only once.".to_string(),
        }),
    ))
}

async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(RateHeaders, Json<Value>)> {
    let agent = authenticate(&state, &headers).await?;
    let rate = state
        .limiter
        .check(&format!("agent:{}", agent.id), AUTHED_PER_MIN, now_ms())?;
    Ok((
        rate,
        Json(json!({
            "id": agent.id,
            "name": agent.name,
            "chips": agent.chips,
            "handsPlayed": agent.hands_played,
            "handsWon": agent.hands_won,
            "currentTable": agent.current_table,
            "rebuys": agent.rebuys,
            "rebuysLeft": MAX_REBUYS - agent.rebuys,
        })),
    ))
}

async fn rebuy(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(RateHeaders, Json<Value>)> {
    let agent = authenticate(&state, &headers).await?;
    let now = now_ms();
    let rate = state
        .limiter
        .check(&format!("agent:{}", agent.id), AUTHED_PER_MIN, now)?;

    if agent.chips >= REBUY_THRESHOLD {
        return Err(AppError::Precondition(format!(
            "Rebuy available only below {REBUY_THRESHOLD} chips"
        )));
    }
    if agent.rebuys >= MAX_REBUYS {
        return Err(AppError::Precondition("No rebuys remaining".to_string()));
    }

    // Conservative rule: no rebuy while contesting a live hand.
    let seated_at = match &agent.current_table {
        Some(table_id) => state.manager.get(table_id).await,
        None => None,
    };
    if let Some(actor) = &seated_at {
        if actor.in_live_hand(&agent.id).await {
            return Err(AppError::Precondition(
                "Cannot rebuy during a hand".to_string(),
            ));
        }
    }

    if !db::agents::rebuy(&state.pool, &agent.id, REBUY_THRESHOLD, MAX_REBUYS, STARTING_CHIPS)
        .await?
    {
        return Err(AppError::Precondition("No rebuys remaining".to_string()));
    }

    // Push the fresh stack to the table cache when seated.
    if let Some(actor) = seated_at {
        let (_, outcome) = actor.update_chips(&agent.id, STARTING_CHIPS, now).await?;
        state.manager.commit_effects(outcome).await;
    }

    tracing::info!("Agent {} rebought to {STARTING_CHIPS} chips", agent.name);
    Ok((
        rate,
        Json(json!({
            "ok": true,
            "chips": STARTING_CHIPS,
            "rebuys": agent.rebuys + 1,
            "rebuysLeft": MAX_REBUYS - agent.rebuys - 1,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

async fn leaderboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<LimitQuery>,
) -> Result<(RateHeaders, Json<Value>)> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    let rate = state
        .limiter
        .check(&format!("public:{ip}"), PUBLIC_PER_MIN, now_ms())?;

    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let agents = db::agents::leaderboard(&state.pool, limit).await?;
    let entries: Vec<Value> = agents
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let win_rate = if a.hands_played > 0 {
                format!("{:.1}%", 100.0 * a.hands_won as f64 / a.hands_played as f64)
            } else {
                "0%".to_string()
            };
            json!({
                "rank": i + 1,
                "id": a.id,
                "name": a.name,
                "chips": a.chips,
                "handsPlayed": a.hands_played,
                "handsWon": a.hands_won,
                "winRate": win_rate,
                "llmProvider": a.llm_provider,
                "llmModel": a.llm_model,
            })
        })
        .collect();
    Ok((rate, Json(json!({ "leaderboard": entries }))))
}

async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
) -> Result<(RateHeaders, Json<Value>)> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    let rate = state
        .limiter
        .check(&format!("public:{ip}"), PUBLIC_PER_MIN, now_ms())?;

    let (total_agents, total_chips) = db::agents::totals(&state.pool).await?;
    let total_hands = db::hand_history::count(&state.pool).await?;
    let tables = state.manager.summaries().await;
    Ok((
        rate,
        Json(json!({
            "totalAgents": total_agents,
            "totalChips": total_chips,
            "totalHands": total_hands,
            "activeTables": tables.len(),
            "tables": tables,
        })),
    ))
}

async fn collusion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
) -> Result<(RateHeaders, Json<Value>)> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    let rate = state
        .limiter
        .check(&format!("public:{ip}"), PUBLIC_PER_MIN, now_ms())?;

    let flagged = db::pairs::watchlist(&state.pool, WATCHLIST_THRESHOLD).await?;
    Ok((rate, Json(json!({ "flagged": flagged }))))
}
