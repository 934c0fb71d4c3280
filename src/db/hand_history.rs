//! Append-only archive of completed hand summaries.

use super::models::HandSummary;
use super::DbPool;
use crate::game::HandRecord;

/// Archive a completed hand. `INSERT OR IGNORE` keyed on the hand id makes
/// retried post-commit flushes idempotent.
pub async fn insert_or_ignore(pool: &DbPool, record: &HandRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO hand_history
             (id, table_id, winner_id, winner_name, winning_hand, pot, player_count, started_at, ended_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.hand_id)
    .bind(&record.table_id)
    .bind(&record.winner_id)
    .bind(&record.winner_name)
    .bind(&record.winning_hand)
    .bind(record.pot)
    .bind(record.players.len() as i64)
    .bind(record.started_at as i64)
    .bind(record.ended_at as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Recent hands at one table, newest first.
pub async fn for_table(
    pool: &DbPool,
    table_id: &str,
    limit: i64,
) -> Result<Vec<HandSummary>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM hand_history WHERE table_id = ? ORDER BY ended_at DESC, id DESC LIMIT ?",
    )
    .bind(table_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Total archived hands, for /stats.
pub async fn count(pool: &DbPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM hand_history")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hand_id: &str, table_id: &str, ended_at: u64) -> HandRecord {
        let mut record = HandRecord::begin(
            hand_id.to_string(),
            table_id.to_string(),
            vec![("a1".into(), "Alice".into(), 1000, vec![])],
            0,
        );
        record.finalize(&[], 80, Some(("a1", "Alice")), Some("Pair of Aces".into()), ended_at);
        record
    }

    #[tokio::test]
    async fn archive_insert_is_idempotent() {
        let pool = crate::create_test_db().await;

        let r = record("h1", "t1", 10);
        insert_or_ignore(&pool, &r).await.unwrap();
        insert_or_ignore(&pool, &r).await.unwrap();
        assert_eq!(count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn table_history_is_newest_first() {
        let pool = crate::create_test_db().await;

        for i in 0..3 {
            insert_or_ignore(&pool, &record(&format!("h{i}"), "t1", i)).await.unwrap();
        }
        insert_or_ignore(&pool, &record("other", "t2", 99)).await.unwrap();

        let hands = for_table(&pool, "t1", 2).await.unwrap();
        assert_eq!(hands.len(), 2);
        assert_eq!(hands[0].id, "h2");
        assert_eq!(hands[1].id, "h1");
        assert_eq!(hands[0].winning_hand.as_deref(), Some("Pair of Aces"));
    }
}
