//! Full hand records stored as JSON, with a bounded per-table retention.

use super::DbPool;
use crate::game::constants::RECORDS_RETAINED_PER_TABLE;
use crate::game::HandRecord;

/// Store a full record and prune the table's tail beyond the retention cap.
pub async fn store(pool: &DbPool, record: &HandRecord) -> Result<(), sqlx::Error> {
    let json = serde_json::to_string(record).unwrap_or_else(|e| {
        tracing::error!("Hand record serialization failed: {e}");
        "{}".to_string()
    });
    sqlx::query(
        "INSERT OR IGNORE INTO hand_records (hand_id, table_id, record, ended_at)
         VALUES (?, ?, ?, ?)",
    )
    .bind(&record.hand_id)
    .bind(&record.table_id)
    .bind(&json)
    .bind(record.ended_at as i64)
    .execute(pool)
    .await?;

    sqlx::query(
        "DELETE FROM hand_records
         WHERE table_id = ?
           AND hand_id NOT IN (
               SELECT hand_id FROM hand_records
               WHERE table_id = ?
               ORDER BY ended_at DESC, hand_id DESC
               LIMIT ?
           )",
    )
    .bind(&record.table_id)
    .bind(&record.table_id)
    .bind(RECORDS_RETAINED_PER_TABLE)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn by_hand_id(pool: &DbPool, hand_id: &str) -> Result<Option<HandRecord>, sqlx::Error> {
    let json: Option<String> = sqlx::query_scalar("SELECT record FROM hand_records WHERE hand_id = ?")
        .bind(hand_id)
        .fetch_optional(pool)
        .await?;
    Ok(json.and_then(|j| serde_json::from_str(&j).ok()))
}

/// The most recent full records for a table, newest first.
pub async fn for_table(
    pool: &DbPool,
    table_id: &str,
    limit: i64,
) -> Result<Vec<HandRecord>, sqlx::Error> {
    let rows: Vec<String> = sqlx::query_scalar(
        "SELECT record FROM hand_records
         WHERE table_id = ?
         ORDER BY ended_at DESC, hand_id DESC
         LIMIT ?",
    )
    .bind(table_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .iter()
        .filter_map(|j| serde_json::from_str(j).ok())
        .collect())
}
