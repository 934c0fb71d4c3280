use super::*;
use crate::game::constants::{MAX_SEATS, MIN_BUYIN_BB};

impl TableState {
    /// Seat an agent with their full bankroll. Seats are assigned in
    /// insertion order; a player arriving mid-hand sits folded until the
    /// next hand deals them in.
    pub fn join(&mut self, agent_id: String, name: String, chips: i64) -> GameResult<usize> {
        if self.find_player(&agent_id).is_some() {
            return Err(GameError::AlreadySeated);
        }
        if self.players.len() >= MAX_SEATS {
            return Err(GameError::TableFull);
        }
        let required = MIN_BUYIN_BB * self.big_blind;
        if chips < required {
            return Err(GameError::InsufficientBuyIn {
                required,
                available: chips,
            });
        }

        let seat = self.players.len();
        let mut player = Player::new(agent_id, name, seat, chips);
        if self.phase.betting_open() {
            player.status = PlayerStatus::Folded;
            tracing::debug!(
                "{} joined table {} mid-hand, dealt in next hand",
                player.name,
                self.table_id
            );
        }
        self.players.push(player);
        Ok(seat)
    }

    /// Remove an agent from the table. Refused while they are still
    /// contesting a live hand; their folded contributions stay in the pot.
    pub fn leave(&mut self, agent_id: &str) -> GameResult<Player> {
        let idx = self.seated(agent_id)?;
        if self.phase.betting_open() && self.players[idx].in_hand() {
            return Err(GameError::InHandCannotLeave);
        }

        let player = self.players.remove(idx);
        for (seat, p) in self.players.iter_mut().enumerate() {
            p.seat_index = seat;
        }
        // Keep the turn and button pointers aimed at the same players.
        if let Some(turn) = self.current_turn {
            if idx < turn {
                self.current_turn = Some(turn - 1);
            } else if idx == turn {
                // Cannot happen for an in-hand player (guarded above); a
                // stale pointer would otherwise dangle.
                self.current_turn = None;
            }
        }
        if idx < self.dealer_index {
            self.dealer_index -= 1;
        }
        if self.dealer_index >= self.players.len() {
            self.dealer_index = 0;
        }
        Ok(player)
    }

    /// Sit out starting with the next hand. Only accepted between hands.
    pub fn sit_out(&mut self, agent_id: &str) -> GameResult<()> {
        let idx = self.seated(agent_id)?;
        if !self.phase.between_hands() {
            return Err(GameError::HandInProgress);
        }
        self.players[idx].status = PlayerStatus::SittingOut;
        self.players[idx].sit_out_count = 0;
        Ok(())
    }

    /// Resume play from the next hand. Only accepted between hands.
    pub fn sit_in(&mut self, agent_id: &str) -> GameResult<()> {
        let idx = self.seated(agent_id)?;
        if !self.phase.between_hands() {
            return Err(GameError::HandInProgress);
        }
        self.players[idx].status = PlayerStatus::Active;
        self.players[idx].sit_out_count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::table_with_hand;
    use super::*;
    use crate::game::AgentAction;

    #[test]
    fn seats_fill_in_insertion_order_up_to_six() {
        let mut table = TableState::new("t".into());
        for i in 0..6 {
            let seat = table
                .join(format!("p{i}"), format!("Player{i}"), 1000)
                .unwrap();
            assert_eq!(seat, i);
        }
        let err = table.join("p6".into(), "Player6".into(), 1000).unwrap_err();
        assert_eq!(err, GameError::TableFull);
    }

    #[test]
    fn duplicate_join_is_rejected() {
        let mut table = TableState::new("t".into());
        table.join("p0".into(), "Player0".into(), 1000).unwrap();
        let err = table.join("p0".into(), "Player0".into(), 1000).unwrap_err();
        assert_eq!(err, GameError::AlreadySeated);
    }

    #[test]
    fn buyin_must_cover_five_big_blinds() {
        let mut table = TableState::new("t".into());
        let err = table.join("p0".into(), "Player0".into(), 99).unwrap_err();
        assert_eq!(
            err,
            GameError::InsufficientBuyIn {
                required: 100,
                available: 99
            }
        );
    }

    #[test]
    fn cannot_leave_while_contesting_a_hand() {
        let mut table = table_with_hand(&[1000, 1000], 0);
        let err = table.leave("p0").unwrap_err();
        assert_eq!(err, GameError::InHandCannotLeave);
    }

    #[test]
    fn folded_players_may_leave_mid_hand_and_pointers_stay_valid() {
        let mut table = table_with_hand(&[1000, 1000, 1000], 0);
        let folder = table.current_turn.unwrap();
        let folder_id = table.players[folder].agent_id.clone();
        table.act(&folder_id, AgentAction::Fold, 0).unwrap();

        let before_turn_agent = table.players[table.current_turn.unwrap()].agent_id.clone();
        let left = table.leave(&folder_id).unwrap();
        assert_eq!(left.agent_id, folder_id);
        let after_turn_agent = table.players[table.current_turn.unwrap()].agent_id.clone();
        assert_eq!(before_turn_agent, after_turn_agent);
    }

    #[test]
    fn sit_out_only_between_hands() {
        let mut table = table_with_hand(&[1000, 1000], 0);
        assert_eq!(table.sit_out("p0").unwrap_err(), GameError::HandInProgress);
    }

    #[test]
    fn mid_hand_joiner_enters_folded() {
        let mut table = table_with_hand(&[1000, 1000], 0);
        table.join("p2".into(), "Player2".into(), 1000).unwrap();
        assert_eq!(table.players[2].status, PlayerStatus::Folded);
        // They never block the betting round.
        assert!(!table.players[2].can_act());
    }
}
