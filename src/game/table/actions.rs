use super::*;
use crate::game::player::AgentAction;

impl TableState {
    /// Apply one betting decision. Either the whole transition commits or a
    /// typed error is returned and nothing changed.
    pub fn act(&mut self, agent_id: &str, action: AgentAction, now_ms: u64) -> GameResult<()> {
        let idx = self.seated(agent_id)?;
        if !self.phase.betting_open() {
            return Err(GameError::HandNotInProgress);
        }
        if self.current_turn != Some(idx) {
            return Err(GameError::NotYourTurn);
        }
        if !self.players[idx].can_act() {
            return Err(GameError::CannotAct);
        }

        tracing::debug!(
            "Table {} seat {} ({}) acts: {:?}",
            self.table_id,
            idx,
            self.players[idx].name,
            action
        );

        let recorded_amount = match action {
            AgentAction::Fold => {
                self.players[idx].fold();
                0
            }
            AgentAction::Check => {
                if self.current_bet != self.players[idx].bet {
                    return Err(GameError::BetToMatch {
                        current_bet: self.current_bet,
                    });
                }
                0
            }
            AgentAction::Call => {
                let to_call = self.current_bet - self.players[idx].bet;
                let actual = self.players[idx].place_bet(to_call);
                self.pot += actual;
                actual
            }
            AgentAction::Raise(amount) => {
                let player = &self.players[idx];
                let contribution = amount - player.bet;
                if contribution > player.chips {
                    return Err(GameError::InsufficientChips {
                        required: contribution,
                        available: player.chips,
                    });
                }
                // Minimum raise is double the standing bet, waived only for
                // an all-in for less.
                let minimum = self.current_bet * 2;
                let is_all_in = contribution == player.chips;
                if (amount <= self.current_bet || amount < minimum) && !is_all_in {
                    return Err(GameError::BelowMinRaise {
                        minimum,
                        attempted: amount,
                    });
                }
                if contribution <= 0 {
                    return Err(GameError::BelowMinRaise {
                        minimum,
                        attempted: amount,
                    });
                }
                let actual = self.players[idx].place_bet(contribution);
                self.pot += actual;
                let new_bet = self.players[idx].bet;
                if new_bet > self.current_bet {
                    self.current_bet = new_bet;
                    self.reopen_action(idx);
                }
                new_bet
            }
            AgentAction::AllIn => {
                let stake = self.players[idx].chips;
                let actual = self.players[idx].place_bet(stake);
                self.pot += actual;
                let new_bet = self.players[idx].bet;
                if new_bet > self.current_bet {
                    self.current_bet = new_bet;
                    self.reopen_action(idx);
                }
                new_bet
            }
        };

        self.players[idx].has_acted = true;
        let agent = self.players[idx].agent_id.clone();
        self.hand_record
            .record_action(&agent, action.kind(), recorded_amount, now_ms);

        self.after_action(now_ms);
        Ok(())
    }

    /// A bet increase gives everyone else a fresh decision.
    fn reopen_action(&mut self, raiser_idx: usize) {
        for (i, p) in self.players.iter_mut().enumerate() {
            if i != raiser_idx && p.can_act() {
                p.has_acted = false;
            }
        }
    }

    /// Post-action bookkeeping: resolve a fold-out, close the betting round,
    /// or pass the turn along.
    pub(crate) fn after_action(&mut self, now_ms: u64) {
        if self.in_hand_count() == 1 {
            self.resolve(now_ms);
            return;
        }
        if self.betting_round_complete() {
            self.advance_phase(now_ms);
            return;
        }
        if let Some(turn) = self.current_turn {
            self.current_turn = self.next_active_seat(turn);
        }
        self.last_action_at = now_ms;
    }

    /// The round closes once every player who can still act has acted and
    /// matched the standing bet. Vacuously complete when nobody can act.
    pub(crate) fn betting_round_complete(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.can_act())
            .all(|p| p.has_acted && p.bet == self.current_bet)
    }

    /// Fire the action timeout: synthesize a fold for the stalled player.
    /// Idempotent per elapsed window — once the fold lands, the turn moves
    /// and the timer basis resets, so repeat invocations are no-ops.
    pub fn timeout(&mut self, now_ms: u64) -> bool {
        if !self.phase.betting_open() {
            return false;
        }
        let idx = match self.current_turn {
            Some(idx) => idx,
            None => return false,
        };
        if now_ms.saturating_sub(self.last_action_at) < self.action_timeout_ms {
            return false;
        }

        tracing::info!(
            "Table {}: auto-folding {} after {}ms of silence",
            self.table_id,
            self.players[idx].name,
            now_ms.saturating_sub(self.last_action_at)
        );
        self.players[idx].fold();
        self.players[idx].has_acted = true;
        let agent = self.players[idx].agent_id.clone();
        self.hand_record.record_action(&agent, "fold", 0, now_ms);
        self.after_action(now_ms);
        true
    }
}
