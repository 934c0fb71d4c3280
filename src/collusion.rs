//! Anti-collusion accumulator: pairwise statistics derived from completed
//! hand records, plus the heuristic score surfaced on the watchlist.
//!
//! The scoring is explicitly approximate. Raw inputs are stored and exposed
//! alongside the score so reviewers can audit a flag; nothing here bans
//! anyone automatically.

use crate::game::HandRecord;
use std::collections::HashMap;

/// Pairs with at least this many shared hands get a score.
pub const MIN_HANDS_FOR_SCORE: i64 = 5;

/// Pairs at or above this score appear on the public watchlist.
pub const WATCHLIST_THRESHOLD: f64 = 0.75;

/// The per-pair delta one completed hand contributes. `agent_a` is always
/// the lexically smaller id so a pair has a single canonical row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairUpdate {
    pub agent_a: String,
    pub agent_b: String,
    pub a_folds_to_b: i64,
    pub b_folds_to_a: i64,
    pub chip_flow_a_to_b: i64,
}

/// Accumulated statistics for one pair, as stored in `agent_pairs`.
#[derive(Debug, Clone, Default)]
pub struct PairStats {
    pub hands_together: i64,
    pub a_folds_to_b: i64,
    pub b_folds_to_a: i64,
    pub chip_flow_a_to_b: i64,
}

/// Derive the pair deltas from one hand: who folded to whose pressure, and
/// which way the pot moved.
pub fn pair_updates(record: &HandRecord) -> Vec<PairUpdate> {
    // Walk the action log once: for every fold, note who the most recent
    // raiser was at that moment.
    let mut last_raiser: Option<&str> = None;
    let mut folded_to: HashMap<&str, &str> = HashMap::new();
    for action in &record.actions {
        match action.action.as_str() {
            "raise" | "all_in" => last_raiser = Some(action.agent_id.as_str()),
            "fold" => {
                if let Some(raiser) = last_raiser {
                    if raiser != action.agent_id {
                        folded_to.insert(action.agent_id.as_str(), raiser);
                    }
                }
            }
            _ => {}
        }
    }

    let winner = record.winner_id.as_deref();
    let ids: Vec<&str> = record.players.iter().map(|p| p.id.as_str()).collect();
    let mut updates = Vec::new();
    for i in 0..ids.len() {
        for j in i + 1..ids.len() {
            let (a, b) = if ids[i] < ids[j] {
                (ids[i], ids[j])
            } else {
                (ids[j], ids[i])
            };
            let chip_flow_a_to_b = match winner {
                Some(w) if w == b => 1,
                Some(w) if w == a => -1,
                _ => 0,
            };
            updates.push(PairUpdate {
                agent_a: a.to_string(),
                agent_b: b.to_string(),
                a_folds_to_b: i64::from(folded_to.get(a) == Some(&b)),
                b_folds_to_a: i64::from(folded_to.get(b) == Some(&a)),
                chip_flow_a_to_b,
            });
        }
    }
    updates
}

/// The heuristic collusion score for one pair. Zero until the pair has
/// enough shared hands to say anything.
pub fn compute_score(stats: &PairStats) -> f64 {
    let n = stats.hands_together;
    if n < MIN_HANDS_FOR_SCORE {
        return 0.0;
    }
    let n_f = n as f64;
    let folds_total = stats.a_folds_to_b + stats.b_folds_to_a;
    let fold_score = (folds_total as f64 / n_f / 0.6).min(1.0);
    let fold_bias =
        stats.a_folds_to_b.max(stats.b_folds_to_a) as f64 / folds_total.max(1) as f64;
    let chip_bias = stats.chip_flow_a_to_b.unsigned_abs() as f64 / n_f;
    let confidence = (n_f / 20.0).min(1.0);
    (0.35 * fold_score + 0.35 * fold_bias + 0.30 * chip_bias) * confidence
}
