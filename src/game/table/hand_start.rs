use super::*;
use crate::game::constants::{
    HOLE_CARDS, MIN_PLAYERS_TO_START, MIN_SMALL_BLIND, SIT_OUT_EVICTION_HANDS,
};

impl TableState {
    /// Blinds scale with the table: small blind is 1% of the average seated
    /// stack, floored at the default, big blind twice that.
    pub(crate) fn compute_blinds(&self) -> (i64, i64) {
        if self.players.is_empty() {
            return (self.small_blind, self.big_blind);
        }
        let total: i64 = self.players.iter().map(|p| p.chips).sum();
        let avg = total / self.players.len() as i64;
        let sb = (avg / 100).max(MIN_SMALL_BLIND);
        (sb, sb * 2)
    }

    /// Whether a new hand could start right now: between hands, with at
    /// least two dealt-in candidates who can cover the upcoming big blind.
    pub fn can_start_hand(&self) -> bool {
        if !self.phase.between_hands() {
            return false;
        }
        let (_, bb) = self.compute_blinds();
        self.players
            .iter()
            .filter(|p| !p.is_sitting_out() && p.chips >= bb)
            .count()
            >= MIN_PLAYERS_TO_START
    }

    /// Start the next hand: recompute blinds, evict dead seats, compact the
    /// dealt-in players to contiguous seats, deal, and post blinds.
    /// Returns false (and falls back to `Waiting`) when the table cannot
    /// field a hand.
    pub fn start_hand(&mut self, now_ms: u64) -> bool {
        if !self.phase.between_hands() {
            return false;
        }

        let (sb, bb) = self.compute_blinds();
        self.small_blind = sb;
        self.big_blind = bb;

        let dealer_agent = self
            .players
            .get(self.dealer_index)
            .map(|p| p.agent_id.clone());

        // Vacate seats that cannot play on: stacks below the big blind, and
        // sitting-out players past the miss limit.
        let mut keep = Vec::with_capacity(self.players.len());
        for player in self.players.drain(..) {
            let evict = if player.is_sitting_out() {
                player.sit_out_count >= SIT_OUT_EVICTION_HANDS
            } else {
                player.chips < bb
            };
            if evict {
                tracing::info!(
                    "Evicting {} from table {} ({} chips, sat out {} hands)",
                    player.name,
                    self.table_id,
                    player.chips,
                    player.sit_out_count
                );
                self.pending_evictions.push(player);
            } else {
                keep.push(player);
            }
        }
        self.players = keep;

        // Dealt-in players first with contiguous seats 0..k-1, sitting-out
        // seats after them. The sort is stable so relative order survives.
        self.players.sort_by_key(|p| p.is_sitting_out());
        for (seat, p) in self.players.iter_mut().enumerate() {
            p.seat_index = seat;
        }
        let k = self.players.iter().filter(|p| !p.is_sitting_out()).count();

        if k < MIN_PLAYERS_TO_START {
            tracing::info!(
                "Table {} cannot start a hand ({} playable seats)",
                self.table_id,
                k
            );
            self.to_waiting();
            return false;
        }

        for p in self.players.iter_mut().filter(|p| p.is_sitting_out()) {
            p.sit_out_count += 1;
        }

        for p in self.players.iter_mut().take(k) {
            p.status = PlayerStatus::Active;
            p.hole_cards.clear();
            p.bet = 0;
            p.total_bet = 0;
            p.has_acted = false;
        }

        // Keep the button on the player chosen at the last resolution if
        // they are still dealt in; otherwise the same numeric seat.
        self.dealer_index = dealer_agent
            .and_then(|id| {
                self.players
                    .iter()
                    .take(k)
                    .position(|p| p.agent_id == id)
            })
            .unwrap_or(self.dealer_index % k);

        self.deck = Deck::shuffled();
        self.community_cards.clear();
        self.pot = 0;
        self.current_bet = 0;
        self.won_without_showdown = false;

        for seat in 0..k {
            match self.deck.deal(HOLE_CARDS) {
                Ok(cards) => self.players[seat].hole_cards = cards,
                Err(e) => {
                    tracing::error!("Dealing hole cards failed on table {}: {e}", self.table_id);
                    self.to_waiting();
                    return false;
                }
            }
        }

        self.hand_no += 1;
        self.hand_id = format!("hand_{}_{}", now_ms, self.hand_no);
        self.chat.clear();
        self.hand_record = HandRecord::begin(
            self.hand_id.clone(),
            self.table_id.clone(),
            self.players
                .iter()
                .take(k)
                .map(|p| {
                    (
                        p.agent_id.clone(),
                        p.name.clone(),
                        p.chips,
                        p.hole_cards.clone(),
                    )
                })
                .collect(),
            now_ms,
        );

        self.post_blinds(k, now_ms);
        self.phase = GamePhase::Preflop;
        self.last_action_at = now_ms;

        tracing::info!(
            "Table {} hand {} started: {} players, blinds {}/{}, dealer seat {}",
            self.table_id,
            self.hand_id,
            k,
            self.small_blind,
            self.big_blind,
            self.dealer_index
        );

        if self.current_turn.is_none() {
            // Blinds put everyone all-in; run the board out immediately.
            self.advance_phase(now_ms);
        }
        true
    }

    /// Post blinds and aim the turn pointer at the first actor. Heads-up the
    /// dealer posts the small blind and acts first preflop.
    fn post_blinds(&mut self, k: usize, now_ms: u64) {
        let (sb_idx, bb_idx) = if k == 2 {
            (self.dealer_index, (self.dealer_index + 1) % 2)
        } else {
            ((self.dealer_index + 1) % k, (self.dealer_index + 2) % k)
        };

        let sb_amount = self.players[sb_idx].place_bet(self.small_blind);
        self.pot += sb_amount;
        let sb_agent = self.players[sb_idx].agent_id.clone();
        self.hand_record
            .record_action(&sb_agent, "small_blind", sb_amount, now_ms);

        let bb_amount = self.players[bb_idx].place_bet(self.big_blind);
        self.pot += bb_amount;
        let bb_agent = self.players[bb_idx].agent_id.clone();
        self.hand_record
            .record_action(&bb_agent, "big_blind", bb_amount, now_ms);

        self.current_bet = self.big_blind;
        self.current_turn = self.next_active_seat(bb_idx);

        tracing::debug!(
            "Blinds posted on table {}: SB {} from seat {}, BB {} from seat {}",
            self.table_id,
            sb_amount,
            sb_idx,
            bb_amount,
            bb_idx
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::table_with_hand;
    use super::*;

    #[test]
    fn heads_up_dealer_posts_small_blind_and_acts_first() {
        let table = table_with_hand(&[1000, 1000], 0);
        let dealer = table.dealer_index;
        let other = (dealer + 1) % 2;
        assert_eq!(table.players[dealer].bet, table.small_blind);
        assert_eq!(table.players[other].bet, table.big_blind);
        assert_eq!(table.current_turn, Some(dealer));
    }

    #[test]
    fn three_handed_blinds_and_first_actor() {
        let table = table_with_hand(&[1000, 1000, 1000], 0);
        let d = table.dealer_index;
        assert_eq!(table.players[(d + 1) % 3].bet, table.small_blind);
        assert_eq!(table.players[(d + 2) % 3].bet, table.big_blind);
        // First to act preflop is the seat after the big blind.
        assert_eq!(table.current_turn, Some(d % 3));
        assert_eq!(table.current_bet, table.big_blind);
        assert_eq!(table.pot, table.small_blind + table.big_blind);
    }

    #[test]
    fn blinds_scale_with_average_stack() {
        let table = table_with_hand(&[10_000, 10_000], 0);
        // avg 10_000 -> sb 100 / bb 200
        assert_eq!(table.small_blind, 100);
        assert_eq!(table.big_blind, 200);
    }

    #[test]
    fn blinds_never_fall_below_the_floor() {
        let table = table_with_hand(&[300, 300], 0);
        assert_eq!(table.small_blind, 10);
        assert_eq!(table.big_blind, 20);
    }

    #[test]
    fn short_stacks_are_evicted_at_hand_start() {
        let mut table = TableState::new("t".into());
        table.join("p0".into(), "Player0".into(), 1000).unwrap();
        table.join("p1".into(), "Player1".into(), 1000).unwrap();
        table.join("p2".into(), "Player2".into(), 1000).unwrap();
        table.players[2].chips = 5; // below any big blind
        assert!(table.start_hand(0));
        assert_eq!(table.players.len(), 2);
        assert_eq!(table.pending_evictions.len(), 1);
        assert_eq!(table.pending_evictions[0].agent_id, "p2");
        // Remaining seats are contiguous.
        assert_eq!(table.players[0].seat_index, 0);
        assert_eq!(table.players[1].seat_index, 1);
    }

    #[test]
    fn sitting_out_players_are_skipped_and_counted() {
        let mut table = TableState::new("t".into());
        table.join("p0".into(), "Player0".into(), 1000).unwrap();
        table.join("p1".into(), "Player1".into(), 1000).unwrap();
        table.join("p2".into(), "Player2".into(), 1000).unwrap();
        table.sit_out("p1").unwrap();
        assert!(table.start_hand(0));
        // Sitting-out seat is pushed after the dealt-in seats.
        assert_eq!(table.players[2].agent_id, "p1");
        assert!(table.players[2].hole_cards.is_empty());
        assert_eq!(table.players[2].sit_out_count, 1);
        assert_eq!(table.players[0].hole_cards.len(), 2);
    }

    #[test]
    fn long_sit_out_vacates_the_seat() {
        let mut table = TableState::new("t".into());
        table.join("p0".into(), "Player0".into(), 1000).unwrap();
        table.join("p1".into(), "Player1".into(), 1000).unwrap();
        table.join("p2".into(), "Player2".into(), 1000).unwrap();
        table.sit_out("p2").unwrap();
        table.players[2].sit_out_count = SIT_OUT_EVICTION_HANDS;
        assert!(table.start_hand(0));
        assert!(table.find_player("p2").is_none());
        assert_eq!(table.pending_evictions[0].agent_id, "p2");
    }

    #[test]
    fn cannot_start_without_two_playable_stacks() {
        let mut table = TableState::new("t".into());
        table.join("p0".into(), "Player0".into(), 1000).unwrap();
        assert!(!table.can_start_hand());
        assert!(!table.start_hand(0));
        assert_eq!(table.phase, GamePhase::Waiting);
    }

    #[test]
    fn starting_chips_recorded_before_blinds() {
        let table = table_with_hand(&[1000, 1000], 0);
        for p in &table.hand_record.players {
            assert_eq!(p.starting_chips, 1000);
            assert_eq!(p.hole_cards.len(), 2);
        }
        // Blind posts are the first recorded actions.
        assert_eq!(table.hand_record.actions[0].action, "small_blind");
        assert_eq!(table.hand_record.actions[1].action, "big_blind");
    }
}
