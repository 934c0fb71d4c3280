//! Persistence for the anti-collusion accumulator: per-key upsert
//! increments followed by a score recompute on the fresh row.

use super::models::PairRow;
use super::DbPool;
use crate::collusion::{compute_score, PairStats, PairUpdate};
use chrono::Utc;

/// Fold one hand's delta into the pair row and refresh its score.
pub async fn apply_update(pool: &DbPool, update: &PairUpdate) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO agent_pairs
             (agent_a, agent_b, hands_together, a_folds_to_b, b_folds_to_a,
              chip_flow_a_to_b, collusion_score, last_updated)
         VALUES (?, ?, 1, ?, ?, ?, 0, ?)
         ON CONFLICT(agent_a, agent_b) DO UPDATE SET
             hands_together = hands_together + 1,
             a_folds_to_b = a_folds_to_b + excluded.a_folds_to_b,
             b_folds_to_a = b_folds_to_a + excluded.b_folds_to_a,
             chip_flow_a_to_b = chip_flow_a_to_b + excluded.chip_flow_a_to_b,
             last_updated = excluded.last_updated",
    )
    .bind(&update.agent_a)
    .bind(&update.agent_b)
    .bind(update.a_folds_to_b)
    .bind(update.b_folds_to_a)
    .bind(update.chip_flow_a_to_b)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    let row: PairRow =
        sqlx::query_as("SELECT * FROM agent_pairs WHERE agent_a = ? AND agent_b = ?")
            .bind(&update.agent_a)
            .bind(&update.agent_b)
            .fetch_one(pool)
            .await?;

    let score = compute_score(&PairStats {
        hands_together: row.hands_together,
        a_folds_to_b: row.a_folds_to_b,
        b_folds_to_a: row.b_folds_to_a,
        chip_flow_a_to_b: row.chip_flow_a_to_b,
    });
    sqlx::query(
        "UPDATE agent_pairs SET collusion_score = ? WHERE agent_a = ? AND agent_b = ?",
    )
    .bind(score)
    .bind(&update.agent_a)
    .bind(&update.agent_b)
    .execute(pool)
    .await?;
    Ok(())
}

/// Pairs at or above the threshold, highest score first.
pub async fn watchlist(pool: &DbPool, threshold: f64) -> Result<Vec<PairRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM agent_pairs WHERE collusion_score >= ? ORDER BY collusion_score DESC",
    )
    .bind(threshold)
    .fetch_all(pool)
    .await
}
