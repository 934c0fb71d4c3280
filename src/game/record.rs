//! Per-hand record accumulated during play and emitted when the hand ends.
//!
//! The record is append-only: the table writes into it as the hand runs and
//! finalizes it at resolution; the gateway fans the finished record out to
//! the archive, the identity store, and the collusion accumulator.

use super::deck::Card;
use serde::{Deserialize, Serialize};

/// A single recorded action. Blind posts use the action types
/// `small_blind` / `big_blind`; player decisions use the wire action names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameAction {
    pub agent_id: String,
    pub action: String,
    pub amount: i64,
    pub timestamp: u64,
}

/// A chat message attached to the hand in which it was sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub from: String,
    pub from_name: String,
    pub text: String,
    pub timestamp: u64,
}

/// Per-player data captured at hand start. `folded` is filled in at hand
/// end and drives hole-card visibility in archived records.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedPlayer {
    pub id: String,
    pub name: String,
    pub starting_chips: i64,
    pub hole_cards: Vec<Card>,
    #[serde(default)]
    pub folded: bool,
}

/// A completed (or in-progress) hand record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandRecord {
    pub hand_id: String,
    pub table_id: String,
    pub players: Vec<RecordedPlayer>,
    pub community_cards: Vec<Card>,
    pub actions: Vec<GameAction>,
    pub chat: Vec<ChatMessage>,
    pub pot: i64,
    pub winner_id: Option<String>,
    pub winner_name: Option<String>,
    pub winning_hand: Option<String>,
    /// True when the hand reached a contested showdown; fold-out wins keep
    /// every hole card private.
    #[serde(default)]
    pub showdown: bool,
    pub started_at: u64,
    pub ended_at: u64,
}

impl HandRecord {
    /// Start recording a new hand. `players` lists the dealt-in seats in
    /// order: (agent_id, name, starting_chips, hole_cards).
    pub fn begin(
        hand_id: String,
        table_id: String,
        players: Vec<(String, String, i64, Vec<Card>)>,
        started_at: u64,
    ) -> Self {
        Self {
            hand_id,
            table_id,
            players: players
                .into_iter()
                .map(|(id, name, starting_chips, hole_cards)| RecordedPlayer {
                    id,
                    name,
                    starting_chips,
                    hole_cards,
                    folded: false,
                })
                .collect(),
            started_at,
            ..Default::default()
        }
    }

    pub fn record_action(&mut self, agent_id: &str, action: &str, amount: i64, now_ms: u64) {
        self.actions.push(GameAction {
            agent_id: agent_id.to_string(),
            action: action.to_string(),
            amount,
            timestamp: now_ms,
        });
    }

    pub fn record_chat(&mut self, msg: ChatMessage) {
        self.chat.push(msg);
    }

    /// Seal the record at hand end.
    pub fn finalize(
        &mut self,
        community_cards: &[Card],
        pot: i64,
        winner: Option<(&str, &str)>,
        winning_hand: Option<String>,
        ended_at: u64,
    ) {
        self.community_cards = community_cards.to_vec();
        self.pot = pot;
        if let Some((id, name)) = winner {
            self.winner_id = Some(id.to_string());
            self.winner_name = Some(name.to_string());
        }
        self.winning_hand = winning_hand;
        self.ended_at = ended_at;
    }
}
