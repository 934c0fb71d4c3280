mod actions;
mod hand_start;
mod phase;
mod seating;
mod showdown;
mod view;

pub use view::{AgentView, PublicPlayerInfo, PublicView, SpectatorPlayer, TableSummary};

use super::{
    constants::{ACTION_TIMEOUT_MS, DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND},
    deck::{Card, Deck},
    error::{GameError, GameResult},
    player::{Player, PlayerStatus},
    record::{ChatMessage, HandRecord},
};
use serde::{Deserialize, Serialize};

/// The per-hand phase cycle. `Waiting` and `Showdown` are the between-hand
/// phases; betting is open during `Preflop` through `River`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Waiting,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl GamePhase {
    pub fn betting_open(&self) -> bool {
        matches!(
            self,
            GamePhase::Preflop | GamePhase::Flop | GamePhase::Turn | GamePhase::River
        )
    }

    pub fn between_hands(&self) -> bool {
        matches!(self, GamePhase::Waiting | GamePhase::Showdown)
    }
}

/// Summary of the most recently completed hand, kept for spectators and
/// polling agents after the pot has been awarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandResult {
    pub hand_id: String,
    pub winner_name: String,
    pub winning_hand: String,
    pub pot: i64,
}

/// The full state of one table. All transitions are synchronous methods that
/// either commit or return a typed error; the current time always flows in
/// from the caller so the engine itself never touches a clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableState {
    pub table_id: String,
    pub hand_id: String,
    pub hand_no: u64,
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub community_cards: Vec<Card>,
    pub pot: i64,
    pub current_bet: i64,
    pub current_turn: Option<usize>,
    pub dealer_index: usize,
    pub small_blind: i64,
    pub big_blind: i64,
    pub deck: Deck,
    pub hand_record: HandRecord,
    pub chat: Vec<ChatMessage>,
    pub last_action_at: u64,
    pub action_timeout_ms: u64,
    pub last_hand_result: Option<HandResult>,
    pub won_without_showdown: bool,

    /// Drained by the actor after each mutation; not part of the snapshot.
    #[serde(skip)]
    pub completed_hand: Option<HandRecord>,
    /// Seats vacated at hand start, drained by the actor.
    #[serde(skip)]
    pub pending_evictions: Vec<Player>,
}

impl TableState {
    pub fn new(table_id: String) -> Self {
        Self {
            table_id,
            hand_id: String::new(),
            hand_no: 0,
            phase: GamePhase::Waiting,
            players: Vec::new(),
            community_cards: Vec::new(),
            pot: 0,
            current_bet: 0,
            current_turn: None,
            dealer_index: 0,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            deck: Deck::standard(),
            hand_record: HandRecord::default(),
            chat: Vec::new(),
            last_action_at: 0,
            action_timeout_ms: ACTION_TIMEOUT_MS,
            last_hand_result: None,
            won_without_showdown: false,
            completed_hand: None,
            pending_evictions: Vec::new(),
        }
    }

    pub(crate) fn find_player(&self, agent_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.agent_id == agent_id)
    }

    pub(crate) fn seated(&self, agent_id: &str) -> GameResult<usize> {
        self.find_player(agent_id).ok_or(GameError::NotSeated)
    }

    /// Next seat after `after` (cyclic, in seat order) whose player can act.
    pub(crate) fn next_active_seat(&self, after: usize) -> Option<usize> {
        let n = self.players.len();
        if n == 0 {
            return None;
        }
        (1..=n)
            .map(|offset| (after + offset) % n)
            .find(|&idx| self.players[idx].can_act())
    }

    /// Players still contesting the pot.
    pub(crate) fn in_hand_count(&self) -> usize {
        self.players.iter().filter(|p| p.in_hand()).count()
    }

    pub(crate) fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.can_act()).count()
    }

    /// Append a chat message; must be seated. Messages sent while a hand is
    /// running are also written into the hand record.
    pub fn chat(&mut self, agent_id: &str, text: String, now_ms: u64) -> GameResult<()> {
        let idx = self.seated(agent_id)?;
        let msg = ChatMessage {
            from: self.players[idx].agent_id.clone(),
            from_name: self.players[idx].name.clone(),
            text,
            timestamp: now_ms,
        };
        if self.phase.betting_open() {
            self.hand_record.record_chat(msg.clone());
        }
        self.chat.push(msg);
        // Bound the in-memory buffer; the record keeps the full log.
        if self.chat.len() > 50 {
            self.chat.remove(0);
        }
        Ok(())
    }

    /// Overwrite a seated player's stack (rebuy path).
    pub fn update_chips(&mut self, agent_id: &str, chips: i64) -> GameResult<()> {
        let idx = self.seated(agent_id)?;
        self.players[idx].chips = chips;
        Ok(())
    }

    /// The multiset check backing the no-card-duplication invariant:
    /// hole cards + community cards + remaining deck during a hand.
    #[cfg(test)]
    pub(crate) fn dealt_and_remaining(&self) -> Vec<Card> {
        let mut all: Vec<Card> = self
            .players
            .iter()
            .flat_map(|p| p.hole_cards.iter().copied())
            .collect();
        all.extend(self.community_cards.iter().copied());
        all.extend(self.deck.cards().iter().copied());
        all
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A table with `stacks.len()` seated players and a started hand,
    /// using fixed ids `p0`, `p1`, ... and names `Player0`, `Player1`, ...
    pub fn table_with_hand(stacks: &[i64], now_ms: u64) -> TableState {
        let mut table = TableState::new("table-1".to_string());
        for (i, &chips) in stacks.iter().enumerate() {
            table
                .join(format!("p{i}"), format!("Player{i}"), chips)
                .expect("join");
        }
        assert!(table.start_hand(now_ms), "hand should start");
        table
    }

    /// Drive every player to check/call until the given phase is reached.
    pub fn advance_to_phase(table: &mut TableState, phase: GamePhase, now_ms: u64) {
        let mut guard = 0;
        while table.phase != phase {
            let idx = table.current_turn.expect("a turn pointer");
            let agent = table.players[idx].agent_id.clone();
            let action = if table.current_bet > table.players[idx].bet {
                crate::game::AgentAction::Call
            } else {
                crate::game::AgentAction::Check
            };
            table.act(&agent, action, now_ms).expect("act");
            guard += 1;
            assert!(guard < 100, "runaway betting loop");
        }
    }
}
