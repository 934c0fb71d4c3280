use super::deck::Card;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,     // Still in the hand (or waiting for the next one)
    Folded,     // Folded this hand
    AllIn,      // All chips committed
    SittingOut, // Seated but not dealt in
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub agent_id: String,
    pub name: String,
    pub chips: i64,
    pub hole_cards: Vec<Card>,
    pub bet: i64,       // contribution this betting round
    pub total_bet: i64, // contribution this hand, drives side pots
    pub status: PlayerStatus,
    pub seat_index: usize,
    pub has_acted: bool,
    pub sit_out_count: u32,
}

impl Player {
    pub fn new(agent_id: String, name: String, seat_index: usize, chips: i64) -> Self {
        Self {
            agent_id,
            name,
            chips,
            hole_cards: vec![],
            bet: 0,
            total_bet: 0,
            status: PlayerStatus::Active,
            seat_index,
            has_acted: false,
            sit_out_count: 0,
        }
    }

    /// Move up to `amount` chips into the pot; short stacks go all-in.
    /// Returns the amount actually contributed.
    pub fn place_bet(&mut self, amount: i64) -> i64 {
        let actual = amount.min(self.chips);
        self.chips -= actual;
        self.bet += actual;
        self.total_bet += actual;
        if self.chips == 0 {
            self.status = PlayerStatus::AllIn;
        }
        actual
    }

    pub fn fold(&mut self) {
        self.status = PlayerStatus::Folded;
    }

    pub fn reset_for_new_round(&mut self) {
        self.bet = 0;
        self.has_acted = self.status != PlayerStatus::Active;
    }

    /// Still contesting the pot (eligible to win a layer).
    pub fn in_hand(&self) -> bool {
        matches!(self.status, PlayerStatus::Active | PlayerStatus::AllIn)
    }

    pub fn can_act(&self) -> bool {
        self.status == PlayerStatus::Active
    }

    pub fn is_sitting_out(&self) -> bool {
        self.status == PlayerStatus::SittingOut
    }
}

/// One betting decision by a player. `Raise` carries the new total bet to
/// match, not the increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "amount")]
pub enum AgentAction {
    Fold,
    Check,
    Call,
    Raise(i64),
    AllIn,
}

impl AgentAction {
    /// Wire name, matching the API's action strings.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentAction::Fold => "fold",
            AgentAction::Check => "check",
            AgentAction::Call => "call",
            AgentAction::Raise(_) => "raise",
            AgentAction::AllIn => "all_in",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_bet_clamps_to_stack_and_goes_all_in() {
        let mut p = Player::new("a1".into(), "Alice".into(), 0, 30);
        let actual = p.place_bet(50);
        assert_eq!(actual, 30);
        assert_eq!(p.chips, 0);
        assert_eq!(p.bet, 30);
        assert_eq!(p.total_bet, 30);
        assert_eq!(p.status, PlayerStatus::AllIn);
    }

    #[test]
    fn round_reset_keeps_total_bet() {
        let mut p = Player::new("a1".into(), "Alice".into(), 0, 500);
        p.place_bet(100);
        p.has_acted = true;
        p.reset_for_new_round();
        assert_eq!(p.bet, 0);
        assert_eq!(p.total_bet, 100);
        assert!(!p.has_acted);
    }

    #[test]
    fn all_in_players_count_as_acted_after_reset() {
        let mut p = Player::new("a1".into(), "Alice".into(), 0, 100);
        p.place_bet(100);
        p.reset_for_new_round();
        assert!(p.has_acted);
        assert!(p.in_hand());
        assert!(!p.can_act());
    }

    #[test]
    fn action_serde_matches_wire_names() {
        assert_eq!(AgentAction::Raise(60).kind(), "raise");
        let json = serde_json::to_string(&AgentAction::AllIn).unwrap();
        assert!(json.contains("all_in"));
    }
}
