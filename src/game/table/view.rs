use super::*;
use crate::game::constants::{CHAT_VISIBLE_MESSAGES, MAX_SEATS};

/// Per-player info every agent and spectator may see.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPlayerInfo {
    pub id: String,
    pub name: String,
    pub chips: i64,
    pub status: PlayerStatus,
    pub bet: i64,
}

/// The filtered view an agent polls from `/table/state`. Contains only that
/// agent's hole cards; everyone else's stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    pub hand_id: String,
    pub phase: GamePhase,
    pub your_cards: Vec<Card>,
    pub community_cards: Vec<Card>,
    pub pot: i64,
    pub current_bet: i64,
    pub your_chips: i64,
    pub your_bet: i64,
    pub is_your_turn: bool,
    pub turn: Option<String>,
    pub time_left_ms: u64,
    pub players: Vec<PublicPlayerInfo>,
    pub recent_chat: Vec<ChatMessage>,
    pub available_actions: Vec<String>,
    pub last_hand_result: Option<HandResult>,
}

/// A spectator's seat view: hole cards appear only for players who reached
/// a real showdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectatorPlayer {
    pub id: String,
    pub name: String,
    pub chips: i64,
    pub status: PlayerStatus,
    pub bet: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
}

/// The unauthenticated spectator view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicView {
    pub table_id: String,
    pub hand_id: String,
    pub phase: GamePhase,
    pub community_cards: Vec<Card>,
    pub pot: i64,
    pub current_bet: i64,
    pub players: Vec<SpectatorPlayer>,
    pub last_hand_result: Option<HandResult>,
}

/// One row of the table listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub table_id: String,
    pub phase: GamePhase,
    pub players: usize,
    pub max_players: usize,
    pub small_blind: i64,
    pub big_blind: i64,
    pub pot: i64,
}

impl TableState {
    fn public_players(&self) -> Vec<PublicPlayerInfo> {
        self.players
            .iter()
            .map(|p| PublicPlayerInfo {
                id: p.agent_id.clone(),
                name: p.name.clone(),
                chips: p.chips,
                status: p.status,
                bet: p.bet,
            })
            .collect()
    }

    fn recent_chat(&self) -> Vec<ChatMessage> {
        let skip = self.chat.len().saturating_sub(CHAT_VISIBLE_MESSAGES);
        self.chat[skip..].to_vec()
    }

    /// The actions open to the seat under the turn pointer.
    fn available_actions(&self, idx: usize) -> Vec<String> {
        let player = &self.players[idx];
        if self.current_turn != Some(idx) || !player.can_act() {
            return vec![];
        }
        let mut actions = vec!["fold".to_string()];
        if self.current_bet <= player.bet {
            actions.push("check".to_string());
        } else {
            actions.push("call".to_string());
        }
        if player.chips > self.current_bet - player.bet {
            actions.push("raise".to_string());
        }
        actions.push("all_in".to_string());
        actions
    }

    /// Milliseconds the current player has left to act.
    fn time_left_ms(&self, now_ms: u64) -> u64 {
        if self.current_turn.is_none() || !self.phase.betting_open() {
            return 0;
        }
        self.action_timeout_ms
            .saturating_sub(now_ms.saturating_sub(self.last_action_at))
    }

    /// The state as seen by one seated agent.
    pub fn agent_view(&self, agent_id: &str, now_ms: u64) -> GameResult<AgentView> {
        let idx = self.seated(agent_id)?;
        let player = &self.players[idx];
        let is_your_turn = self.current_turn == Some(idx);
        Ok(AgentView {
            hand_id: self.hand_id.clone(),
            phase: self.phase,
            your_cards: player.hole_cards.clone(),
            community_cards: self.community_cards.clone(),
            pot: self.pot,
            current_bet: self.current_bet,
            your_chips: player.chips,
            your_bet: player.bet,
            is_your_turn,
            turn: self
                .current_turn
                .map(|t| self.players[t].agent_id.clone()),
            time_left_ms: self.time_left_ms(now_ms),
            players: self.public_players(),
            recent_chat: self.recent_chat(),
            available_actions: self.available_actions(idx),
            last_hand_result: self.last_hand_result.clone(),
        })
    }

    /// The spectator view. Hole cards are shown only at a contested
    /// showdown, and only for players who did not fold.
    pub fn public_view(&self) -> PublicView {
        let reveal = self.phase == GamePhase::Showdown && !self.won_without_showdown;
        PublicView {
            table_id: self.table_id.clone(),
            hand_id: self.hand_id.clone(),
            phase: self.phase,
            community_cards: self.community_cards.clone(),
            pot: self.pot,
            current_bet: self.current_bet,
            players: self
                .players
                .iter()
                .map(|p| SpectatorPlayer {
                    id: p.agent_id.clone(),
                    name: p.name.clone(),
                    chips: p.chips,
                    status: p.status,
                    bet: p.bet,
                    cards: if reveal && p.in_hand() && !p.hole_cards.is_empty() {
                        Some(p.hole_cards.clone())
                    } else {
                        None
                    },
                })
                .collect(),
            last_hand_result: self.last_hand_result.clone(),
        }
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            table_id: self.table_id.clone(),
            phase: self.phase,
            players: self.players.len(),
            max_players: MAX_SEATS,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            pot: self.pot,
        }
    }

    pub fn has_free_seat(&self) -> bool {
        self.players.len() < MAX_SEATS
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{advance_to_phase, table_with_hand};
    use super::*;
    use crate::game::AgentAction;

    #[test]
    fn agents_never_see_foreign_hole_cards() {
        let table = table_with_hand(&[1000, 1000, 1000], 0);
        let view = table.agent_view("p0", 0).unwrap();
        assert_eq!(view.your_cards, table.players[0].hole_cards);
        let json = serde_json::to_string(&view).unwrap();
        for other in &table.players[1..] {
            for card in &other.hole_cards {
                // A foreign card string may collide with one of ours or the
                // board; only fail when it could not have come from there.
                let visible: Vec<String> = view
                    .your_cards
                    .iter()
                    .chain(view.community_cards.iter())
                    .map(|c| c.to_string())
                    .collect();
                if !visible.contains(&card.to_string()) {
                    assert!(
                        !json.contains(&format!("\"{}\"", card)),
                        "foreign hole card leaked into the view"
                    );
                }
            }
        }
    }

    #[test]
    fn turn_holder_sees_available_actions() {
        let table = table_with_hand(&[1000, 1000, 1000], 0);
        let turn = table.current_turn.unwrap();
        let agent = table.players[turn].agent_id.clone();
        let view = table.agent_view(&agent, 0).unwrap();
        assert!(view.is_your_turn);
        // Facing the big blind: fold / call / raise / all_in, no check.
        assert_eq!(view.available_actions, vec!["fold", "call", "raise", "all_in"]);

        let other = table.players[(turn + 1) % 3].agent_id.clone();
        let other_view = table.agent_view(&other, 0).unwrap();
        assert!(!other_view.is_your_turn);
        assert!(other_view.available_actions.is_empty());
    }

    #[test]
    fn check_replaces_call_when_nothing_to_match() {
        let mut table = table_with_hand(&[1000, 1000], 0);
        advance_to_phase(&mut table, GamePhase::Flop, 0);
        let turn = table.current_turn.unwrap();
        let agent = table.players[turn].agent_id.clone();
        let view = table.agent_view(&agent, 0).unwrap();
        assert!(view.available_actions.contains(&"check".to_string()));
        assert!(!view.available_actions.contains(&"call".to_string()));
    }

    #[test]
    fn time_left_counts_down_from_the_timeout() {
        let table = table_with_hand(&[1000, 1000], 0);
        let view = table.agent_view("p0", 5_000).unwrap();
        assert_eq!(view.time_left_ms, 10_000);
    }

    #[test]
    fn spectators_see_cards_only_at_a_contested_showdown() {
        let mut table = table_with_hand(&[1000, 1000], 0);
        let mid_hand = table.public_view();
        assert!(mid_hand.players.iter().all(|p| p.cards.is_none()));

        advance_to_phase(&mut table, GamePhase::Showdown, 0);
        let showdown = table.public_view();
        assert!(showdown
            .players
            .iter()
            .all(|p| p.cards.as_ref().map(|c| c.len()) == Some(2)));
    }

    #[test]
    fn fold_out_reveals_nothing_to_spectators() {
        let mut table = table_with_hand(&[1000, 1000], 0);
        let turn = table.current_turn.unwrap();
        let agent = table.players[turn].agent_id.clone();
        table.act(&agent, AgentAction::Fold, 0).unwrap();
        assert_eq!(table.phase, GamePhase::Showdown);
        let view = table.public_view();
        assert!(view.players.iter().all(|p| p.cards.is_none()));
    }
}
