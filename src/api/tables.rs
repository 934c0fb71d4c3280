//! Table routes: seating, actions, chat, views, history, and the admin
//! reset. Every authenticated handler follows the same shape — bearer auth,
//! rate check, table resolution, actor call, post-commit fan-out.

use super::rate_limit::{client_ip, RateHeaders, AUTHED_PER_MIN, CHAT_PER_MIN, PUBLIC_PER_MIN};
use super::{authenticate, now_ms, AppState};
use crate::db::models::Agent;
use crate::db;
use crate::error::{AppError, Result};
use crate::game::constants::{HISTORY_DEFAULT_LIMIT, HISTORY_MAX_LIMIT};
use crate::game::{AgentAction, HandRecord};
use crate::sanitize::sanitize_chat;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/table/join", post(join))
        .route("/table/leave", post(leave))
        .route("/table/sit-out", post(sit_out))
        .route("/table/sit-in", post(sit_in))
        .route("/table/state", get(table_state))
        .route("/table/act", post(act))
        .route("/table/chat", post(chat))
        .route("/table/history", get(history))
        .route("/table/:id/spectate", get(spectate))
        .route("/table/:id/history", get(public_history))
        .route("/table/:id/reset", post(reset))
}

async fn authed(
    state: &AppState,
    headers: &HeaderMap,
    limit: u32,
) -> Result<(Agent, RateHeaders)> {
    let agent = authenticate(state, headers).await?;
    let rate = state
        .limiter
        .check(&format!("agent:{}", agent.id), limit, now_ms())?;
    Ok((agent, rate))
}

/// The table the agent is currently seated at.
async fn current_table(
    state: &AppState,
    agent: &Agent,
) -> Result<Arc<crate::actor::TableActor>> {
    let table_id = agent
        .current_table
        .as_deref()
        .ok_or_else(|| AppError::Precondition("Not at a table".to_string()))?;
    state
        .manager
        .get(table_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown table: {table_id}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub table_id: Option<String>,
}

async fn join(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<JoinRequest>>,
) -> Result<(RateHeaders, Json<Value>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    if agent.current_table.is_some() {
        return Err(AppError::Precondition("Already at a table".to_string()));
    }

    let requested = body.as_ref().and_then(|b| b.table_id.as_deref());
    let actor = state.manager.table_for_join(requested).await?;

    // The conditional claim keeps current_table single-valued even when the
    // same key joins from two connections at once.
    if !db::agents::claim_table(&state.pool, &agent.id, &actor.table_id).await? {
        return Err(AppError::Precondition("Already at a table".to_string()));
    }
    match actor
        .join(agent.id.clone(), agent.name.clone(), agent.chips, now_ms())
        .await
    {
        Ok((seat, outcome)) => {
            state.manager.commit_effects(outcome).await;
            Ok((
                rate,
                Json(json!({ "ok": true, "tableId": actor.table_id, "seat": seat })),
            ))
        }
        Err(e) => {
            // Roll the claim back so the agent is not stuck at a table
            // they never sat down at.
            if let Err(clear_err) = db::agents::clear_table(&state.pool, &agent.id).await {
                tracing::warn!("Failed to release table claim: {clear_err}");
            }
            Err(e)
        }
    }
}

async fn leave(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(RateHeaders, Json<Value>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    let actor = current_table(&state, &agent).await?;

    let (player, outcome) = actor.leave(&agent.id).await?;
    db::agents::set_chips(&state.pool, &agent.id, player.chips).await?;
    db::agents::clear_table(&state.pool, &agent.id).await?;
    state.manager.commit_effects(outcome).await;
    Ok((rate, Json(json!({ "ok": true, "chips": player.chips }))))
}

async fn sit_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(RateHeaders, Json<Value>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    let actor = current_table(&state, &agent).await?;
    let (_, outcome) = actor.sit_out(&agent.id).await?;
    state.manager.commit_effects(outcome).await;
    Ok((rate, Json(json!({ "ok": true }))))
}

async fn sit_in(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(RateHeaders, Json<Value>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    let actor = current_table(&state, &agent).await?;
    let (_, outcome) = actor.sit_in(&agent.id, now_ms()).await?;
    state.manager.commit_effects(outcome).await;
    Ok((rate, Json(json!({ "ok": true }))))
}

async fn table_state(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(RateHeaders, Json<crate::game::AgentView>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    let actor = current_table(&state, &agent).await?;
    let view = actor.agent_view(&agent.id, now_ms()).await?;
    Ok((rate, Json(view)))
}

#[derive(Debug, Deserialize)]
pub struct ActRequest {
    pub action: String,
    pub amount: Option<i64>,
}

fn parse_action(req: &ActRequest) -> Result<AgentAction> {
    match req.action.as_str() {
        "fold" => Ok(AgentAction::Fold),
        "check" => Ok(AgentAction::Check),
        "call" => Ok(AgentAction::Call),
        "all_in" => Ok(AgentAction::AllIn),
        "raise" => {
            let amount = req.amount.ok_or_else(|| {
                AppError::Validation("Raise requires an amount".to_string())
            })?;
            if amount <= 0 {
                return Err(AppError::Validation("Raise amount must be positive".to_string()));
            }
            Ok(AgentAction::Raise(amount))
        }
        other => Err(AppError::Validation(format!("Unknown action: {other}"))),
    }
}

async fn act(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ActRequest>,
) -> Result<(RateHeaders, Json<Value>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    let actor = current_table(&state, &agent).await?;
    let action = parse_action(&req)?;

    let now = now_ms();
    let (_, outcome) = actor.act(&agent.id, action, now).await?;
    state.manager.commit_effects(outcome).await;

    let view = actor.agent_view(&agent.id, now).await?;
    Ok((rate, Json(json!({ "ok": true, "state": view }))))
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<(RateHeaders, Json<Value>)> {
    let agent = authenticate(&state, &headers).await?;
    let rate = state
        .limiter
        .check(&format!("chat:{}", agent.id), CHAT_PER_MIN, now_ms())?;
    let actor = current_table(&state, &agent).await?;

    let clean = sanitize_chat(&req.text)
        .map_err(|rejection| AppError::Validation(rejection.to_string()))?;
    let (_, outcome) = actor.chat(&agent.id, clean, now_ms()).await?;
    state.manager.commit_effects(outcome).await;
    Ok((rate, Json(json!({ "ok": true }))))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

fn history_limit(query: &LimitQuery) -> i64 {
    query
        .limit
        .unwrap_or(HISTORY_DEFAULT_LIMIT)
        .clamp(1, HISTORY_MAX_LIMIT)
}

/// Hide hole cards the viewer has no right to see: everything on a fold-out
/// win, and folded players' cards even after a showdown.
fn redact_record(mut record: HandRecord, viewer: Option<&str>) -> HandRecord {
    for player in &mut record.players {
        let own = viewer == Some(player.id.as_str());
        let shown = record.showdown && !player.folded;
        if !own && !shown {
            player.hole_cards.clear();
        }
    }
    record
}

async fn history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<LimitQuery>,
) -> Result<(RateHeaders, Json<Value>)> {
    let (agent, rate) = authed(&state, &headers, AUTHED_PER_MIN).await?;
    let table_id = agent
        .current_table
        .as_deref()
        .ok_or_else(|| AppError::Precondition("Not at a table".to_string()))?;

    let hands = db::records::for_table(&state.pool, table_id, history_limit(&query)).await?;
    let hands: Vec<HandRecord> = hands
        .into_iter()
        .map(|r| redact_record(r, Some(&agent.id)))
        .collect();
    Ok((rate, Json(json!({ "hands": hands }))))
}

async fn spectate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
    Path(table_id): Path<String>,
) -> Result<(RateHeaders, Json<crate::game::PublicView>)> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    let rate = state
        .limiter
        .check(&format!("public:{ip}"), PUBLIC_PER_MIN, now_ms())?;
    let actor = state
        .manager
        .get(&table_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown table: {table_id}")))?;
    Ok((rate, Json(actor.public_view().await)))
}

async fn public_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    addr: Option<ConnectInfo<SocketAddr>>,
    Path(table_id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Result<(RateHeaders, Json<Value>)> {
    let ip = client_ip(&headers, addr.map(|a| a.0));
    let rate = state
        .limiter
        .check(&format!("public:{ip}"), PUBLIC_PER_MIN, now_ms())?;

    let hands = db::records::for_table(&state.pool, &table_id, history_limit(&query)).await?;
    let hands: Vec<HandRecord> = hands
        .into_iter()
        .map(|r| redact_record(r, None))
        .collect();
    Ok((rate, Json(json!({ "hands": hands }))))
}

async fn reset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(table_id): Path<String>,
) -> Result<Json<Value>> {
    let provided = headers
        .get("x-admin-key")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    if provided != state.admin_key {
        return Err(AppError::Forbidden("Invalid admin key".to_string()));
    }
    let actor = state
        .manager
        .get(&table_id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Unknown table: {table_id}")))?;

    let outcome = actor.reset().await?;
    state.manager.commit_effects(outcome).await;
    tracing::warn!("Admin reset of table {table_id}");
    Ok(Json(json!({ "ok": true })))
}
