use super::*;
use crate::game::constants::{FLOP_CARDS, RIVER_CARDS, TURN_CARDS};

impl TableState {
    /// Close the betting round and deal the next street, resolving after
    /// the river. With fewer than two players able to act the board runs
    /// out street by street until resolution.
    pub(crate) fn advance_phase(&mut self, now_ms: u64) {
        for p in self.players.iter_mut() {
            p.reset_for_new_round();
        }
        self.current_bet = 0;

        let deal_count = match self.phase {
            GamePhase::Preflop => {
                self.phase = GamePhase::Flop;
                FLOP_CARDS
            }
            GamePhase::Flop => {
                self.phase = GamePhase::Turn;
                TURN_CARDS
            }
            GamePhase::Turn => {
                self.phase = GamePhase::River;
                RIVER_CARDS
            }
            GamePhase::River => {
                self.resolve(now_ms);
                return;
            }
            GamePhase::Waiting | GamePhase::Showdown => return,
        };

        match self.deck.deal(deal_count) {
            Ok(cards) => self.community_cards.extend(cards),
            Err(e) => {
                tracing::error!(
                    "Dealing the {:?} failed on table {}: {e}",
                    self.phase,
                    self.table_id
                );
                return;
            }
        }

        tracing::debug!(
            "Table {} advanced to {:?}, board: {}",
            self.table_id,
            self.phase,
            self.community_cards
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        );

        self.last_action_at = now_ms;
        if self.active_count() < 2 {
            // Everyone left in the hand is all-in: no more betting, run the
            // remaining streets out.
            self.current_turn = None;
            self.advance_phase(now_ms);
        } else {
            // First to act post-flop is the first active seat after the
            // dealer.
            self.current_turn = self.next_active_seat(self.dealer_index);
        }
    }

    /// Drop back to the waiting phase with no hand in flight.
    pub(crate) fn to_waiting(&mut self) {
        self.phase = GamePhase::Waiting;
        self.current_turn = None;
        self.current_bet = 0;
        self.pot = 0;
        self.community_cards.clear();
    }
}
