use super::*;
use crate::game::eval::{determine_winners, evaluate_hand, HandRank};

impl TableState {
    /// Resolve the hand: build the side-pot layers from total contributions,
    /// award each layer to its best eligible hand, rotate the button, and
    /// seal the hand record.
    pub(crate) fn resolve(&mut self, now_ms: u64) {
        self.current_turn = None;
        let total_pot = self.pot;
        let mut awards: Vec<i64> = vec![0; self.players.len()];

        let contenders: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_hand())
            .map(|(idx, _)| idx)
            .collect();

        let (winner_idx, winning_hand) = if contenders.len() == 1 {
            // Fold-out: the survivor takes the pot, nothing is revealed.
            self.won_without_showdown = true;
            awards[contenders[0]] = total_pot;
            (contenders[0], "Last player standing".to_string())
        } else {
            self.won_without_showdown = false;
            let ranks: Vec<(usize, HandRank)> = contenders
                .iter()
                .map(|&idx| {
                    (
                        idx,
                        evaluate_hand(&self.players[idx].hole_cards, &self.community_cards),
                    )
                })
                .collect();

            // Every distinct positive contribution total is a layer
            // boundary, so folded players' chips fund the layers they
            // reached without ever being eligible to win them.
            let mut levels: Vec<i64> = self
                .players
                .iter()
                .map(|p| p.total_bet)
                .filter(|&b| b > 0)
                .collect();
            levels.sort_unstable();
            levels.dedup();

            let mut main_pot_winner = contenders[0];
            let mut prev = 0i64;
            for (layer_no, &level) in levels.iter().enumerate() {
                let contributors = self
                    .players
                    .iter()
                    .filter(|p| p.total_bet >= level)
                    .count() as i64;
                let amount = (level - prev) * contributors;
                prev = level;

                let eligible: Vec<(usize, HandRank)> = ranks
                    .iter()
                    .filter(|(idx, _)| self.players[*idx].total_bet >= level)
                    .cloned()
                    .collect();
                let winners = determine_winners(&eligible);
                if winners.is_empty() {
                    // An uncalled layer (everyone above it folded) returns
                    // to its sole contributor via the level construction;
                    // with no eligible hand there is nobody to pay.
                    tracing::warn!(
                        "Table {}: pot layer of {} had no eligible winner",
                        self.table_id,
                        amount
                    );
                    continue;
                }

                let share = amount / winners.len() as i64;
                let remainder = amount % winners.len() as i64;
                for (i, &w) in winners.iter().enumerate() {
                    // The earliest seat among the winners takes the odd chips.
                    awards[w] += if i == 0 { share + remainder } else { share };
                }
                if layer_no == 0 {
                    main_pot_winner = winners[0];
                }
            }

            let desc = ranks
                .iter()
                .find(|(idx, _)| *idx == main_pot_winner)
                .map(|(_, r)| r.describe())
                .unwrap_or_default();
            (main_pot_winner, desc)
        };

        let awarded: i64 = awards.iter().sum();
        debug_assert_eq!(awarded, total_pot, "awards must equal the pot");
        if awarded != total_pot {
            tracing::error!(
                "Table {}: award mismatch, pot {} vs awarded {}",
                self.table_id,
                total_pot,
                awarded
            );
        }

        for (idx, amount) in awards.iter().enumerate() {
            if *amount > 0 {
                self.players[idx].chips += amount;
                tracing::info!(
                    "Table {}: {} wins {} ({})",
                    self.table_id,
                    self.players[idx].name,
                    amount,
                    winning_hand
                );
            }
        }
        self.pot = 0;
        self.phase = GamePhase::Showdown;
        self.last_action_at = now_ms;

        // Button moves one seat over the players still dealt in next hand.
        let n = self.players.len();
        if n > 0 {
            self.dealer_index = (1..=n)
                .map(|offset| (self.dealer_index + offset) % n)
                .find(|&idx| !self.players[idx].is_sitting_out())
                .unwrap_or(self.dealer_index);
        }

        let winner = &self.players[winner_idx];
        self.last_hand_result = Some(HandResult {
            hand_id: self.hand_id.clone(),
            winner_name: winner.name.clone(),
            winning_hand: winning_hand.clone(),
            pot: total_pot,
        });
        let winner_pair = (winner.agent_id.clone(), winner.name.clone());

        // Fold state drives hole-card visibility in the archived record.
        for recorded in &mut self.hand_record.players {
            recorded.folded = self
                .players
                .iter()
                .find(|p| p.agent_id == recorded.id)
                .map(|p| !p.in_hand())
                .unwrap_or(true);
        }
        self.hand_record.showdown = !self.won_without_showdown;
        self.hand_record.finalize(
            &self.community_cards,
            total_pot,
            Some((&winner_pair.0, &winner_pair.1)),
            Some(winning_hand),
            now_ms,
        );
        self.completed_hand = Some(self.hand_record.clone());
    }
}
