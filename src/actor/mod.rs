//! The table actor: the single-writer boundary owning one table's state.
//!
//! Every mutating call serializes through the actor's lock, applies a pure
//! engine transition, and persists the full snapshot *before* returning to
//! the caller. Side effects that belong outside the table (chip write-back,
//! archive inserts, collusion updates) are drained into an [`ActionOutcome`]
//! and handled best-effort by the manager afterwards.

pub mod manager;

pub use manager::TableManager;

use crate::db::{self, DbPool};
use crate::error::Result;
use crate::game::constants::SHOWDOWN_COOLDOWN_MS;
use crate::game::{
    AgentAction, AgentView, GamePhase, GameResult, HandRecord, Player, PublicView, TableState,
    TableSummary,
};
use tokio::sync::Mutex;

/// Side effects of a committed mutation, drained from the table state and
/// fanned out by the manager after the snapshot is durable.
#[derive(Debug, Default)]
pub struct ActionOutcome {
    pub completed_hand: Option<HandRecord>,
    pub evicted: Vec<Player>,
    /// Authoritative stacks of everyone still seated, written back to the
    /// identity store after each commit.
    pub chip_syncs: Vec<(String, i64)>,
}

pub struct TableActor {
    pub table_id: String,
    state: Mutex<TableState>,
    pool: DbPool,
}

impl TableActor {
    pub fn new(pool: DbPool, state: TableState) -> Self {
        Self {
            table_id: state.table_id.clone(),
            state: Mutex::new(state),
            pool,
        }
    }

    /// Run one mutation under the single-writer lock: pure transition,
    /// snapshot persistence, then side-effect drain. An engine error leaves
    /// the state untouched and persists nothing.
    async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut TableState) -> GameResult<T>,
    ) -> Result<(T, ActionOutcome)> {
        let mut state = self.state.lock().await;
        let value = f(&mut state)?;
        db::snapshots::save(&self.pool, &state).await?;
        Ok((value, Self::drain(&mut state)))
    }

    fn drain(state: &mut TableState) -> ActionOutcome {
        ActionOutcome {
            completed_hand: state.completed_hand.take(),
            evicted: std::mem::take(&mut state.pending_evictions),
            chip_syncs: state
                .players
                .iter()
                .map(|p| (p.agent_id.clone(), p.chips))
                .collect(),
        }
    }

    pub async fn join(
        &self,
        agent_id: String,
        name: String,
        chips: i64,
        now_ms: u64,
    ) -> Result<(usize, ActionOutcome)> {
        self.mutate(|state| {
            let seat = state.join(agent_id, name, chips)?;
            if state.phase == GamePhase::Waiting && state.can_start_hand() {
                state.start_hand(now_ms);
            }
            Ok(seat)
        })
        .await
    }

    pub async fn leave(&self, agent_id: &str) -> Result<(Player, ActionOutcome)> {
        self.mutate(|state| state.leave(agent_id)).await
    }

    pub async fn sit_out(&self, agent_id: &str) -> Result<((), ActionOutcome)> {
        self.mutate(|state| state.sit_out(agent_id)).await
    }

    pub async fn sit_in(&self, agent_id: &str, now_ms: u64) -> Result<((), ActionOutcome)> {
        self.mutate(|state| {
            state.sit_in(agent_id)?;
            if state.phase == GamePhase::Waiting && state.can_start_hand() {
                state.start_hand(now_ms);
            }
            Ok(())
        })
        .await
    }

    pub async fn act(
        &self,
        agent_id: &str,
        action: AgentAction,
        now_ms: u64,
    ) -> Result<((), ActionOutcome)> {
        self.mutate(|state| state.act(agent_id, action, now_ms)).await
    }

    pub async fn chat(
        &self,
        agent_id: &str,
        text: String,
        now_ms: u64,
    ) -> Result<((), ActionOutcome)> {
        self.mutate(|state| state.chat(agent_id, text, now_ms)).await
    }

    /// Push an authoritative stack from the identity store (rebuy path).
    /// Refused while the agent is contesting a live hand.
    pub async fn update_chips(
        &self,
        agent_id: &str,
        chips: i64,
        now_ms: u64,
    ) -> Result<((), ActionOutcome)> {
        self.mutate(|state| {
            if state.phase.betting_open() {
                if let Some(idx) = state.find_player(agent_id) {
                    if state.players[idx].in_hand() {
                        return Err(crate::game::GameError::HandInProgress);
                    }
                }
            }
            state.update_chips(agent_id, chips)?;
            if state.phase == GamePhase::Waiting && state.can_start_hand() {
                state.start_hand(now_ms);
            }
            Ok(())
        })
        .await
    }

    /// Admin wipe: every seat is vacated and the table returns to waiting.
    pub async fn reset(&self) -> Result<ActionOutcome> {
        let mut state = self.state.lock().await;
        let evicted = std::mem::take(&mut state.players);
        *state = TableState::new(self.table_id.clone());
        db::snapshots::save(&self.pool, &state).await?;
        tracing::info!("Table {} reset, {} seats vacated", self.table_id, evicted.len());
        Ok(ActionOutcome {
            evicted,
            ..Default::default()
        })
    }

    /// Clock input: fire the action timeout and the post-showdown cooldown.
    /// Persists only when something actually moved.
    pub async fn tick(&self, now_ms: u64) -> Result<ActionOutcome> {
        let mut state = self.state.lock().await;
        let mut changed = state.timeout(now_ms);

        match state.phase {
            GamePhase::Showdown
                if now_ms.saturating_sub(state.last_action_at) >= SHOWDOWN_COOLDOWN_MS =>
            {
                if state.can_start_hand() {
                    changed |= state.start_hand(now_ms);
                } else {
                    state.to_waiting();
                    changed = true;
                }
            }
            // A rebuy or sit-in during waiting can make the table playable
            // without another join arriving.
            GamePhase::Waiting if state.can_start_hand() => {
                changed |= state.start_hand(now_ms);
            }
            _ => {}
        }

        if !changed {
            return Ok(ActionOutcome::default());
        }
        db::snapshots::save(&self.pool, &state).await?;
        Ok(Self::drain(&mut state))
    }

    pub async fn agent_view(&self, agent_id: &str, now_ms: u64) -> Result<AgentView> {
        let state = self.state.lock().await;
        Ok(state.agent_view(agent_id, now_ms)?)
    }

    pub async fn public_view(&self) -> PublicView {
        self.state.lock().await.public_view()
    }

    pub async fn summary(&self) -> TableSummary {
        self.state.lock().await.summary()
    }

    pub async fn has_free_seat(&self) -> bool {
        self.state.lock().await.has_free_seat()
    }

    /// Current phase, for gateway guards.
    pub async fn phase(&self) -> GamePhase {
        self.state.lock().await.phase
    }

    /// Is the agent still contesting a live hand? Gateway pre-check for the
    /// rebuy path.
    pub async fn in_live_hand(&self, agent_id: &str) -> bool {
        let state = self.state.lock().await;
        state.phase.betting_open()
            && state
                .find_player(agent_id)
                .map(|idx| state.players[idx].in_hand())
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::game::constants::ACTION_TIMEOUT_MS;

    async fn actor() -> TableActor {
        let pool = crate::create_test_db().await;
        TableActor::new(pool, TableState::new("table-1".to_string()))
    }

    #[tokio::test]
    async fn join_persists_before_acknowledging() {
        let actor = actor().await;
        actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap();
        let loaded = db::snapshots::load_all(&actor.pool).await.unwrap();
        assert_eq!(loaded[0].players.len(), 1);
    }

    #[tokio::test]
    async fn second_join_starts_the_hand_and_syncs_chips() {
        let actor = actor().await;
        actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap();
        let (_, outcome) = actor
            .join("a2".into(), "Bob".into(), 1000, 0)
            .await
            .unwrap();
        assert_eq!(actor.phase().await, GamePhase::Preflop);
        // Blind posters' stacks flow back toward the identity store.
        assert_eq!(outcome.chip_syncs.len(), 2);
        assert!(outcome.chip_syncs.iter().any(|(_, chips)| *chips < 1000));
    }

    #[tokio::test]
    async fn engine_errors_do_not_persist_anything() {
        let actor = actor().await;
        actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap();
        let err = actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Precondition(_)));
        let loaded = db::snapshots::load_all(&actor.pool).await.unwrap();
        assert_eq!(loaded[0].players.len(), 1);
    }

    #[tokio::test]
    async fn tick_fires_the_timeout_and_then_the_next_hand() {
        let actor = actor().await;
        actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap();
        actor
            .join("a2".into(), "Bob".into(), 1000, 0)
            .await
            .unwrap();

        // First tick: nothing due yet.
        let outcome = actor.tick(1000).await.unwrap();
        assert!(outcome.completed_hand.is_none());

        // The stalled opener is folded out; heads-up that ends the hand.
        let outcome = actor.tick(ACTION_TIMEOUT_MS).await.unwrap();
        let record = outcome.completed_hand.expect("hand should have completed");
        assert_eq!(record.players.len(), 2);
        assert_eq!(actor.phase().await, GamePhase::Showdown);

        // After the cooldown the next hand deals itself.
        let outcome = actor
            .tick(ACTION_TIMEOUT_MS + SHOWDOWN_COOLDOWN_MS)
            .await
            .unwrap();
        assert!(outcome.completed_hand.is_none());
        assert_eq!(actor.phase().await, GamePhase::Preflop);
    }

    #[tokio::test]
    async fn rebuy_push_is_refused_mid_hand() {
        let actor = actor().await;
        actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap();
        actor
            .join("a2".into(), "Bob".into(), 1000, 0)
            .await
            .unwrap();
        let err = actor.update_chips("a1", 1000, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Precondition(_)));
    }

    #[tokio::test]
    async fn reset_vacates_every_seat() {
        let actor = actor().await;
        actor
            .join("a1".into(), "Alice".into(), 1000, 0)
            .await
            .unwrap();
        let outcome = actor.reset().await.unwrap();
        assert_eq!(outcome.evicted.len(), 1);
        assert_eq!(actor.phase().await, GamePhase::Waiting);
        assert!(actor.has_free_seat().await);
    }
}
