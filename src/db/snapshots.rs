//! Durable table-actor state: the whole `TableState` serialized per table.
//! A snapshot is written before any mutation is acknowledged, so recovery
//! never observes an effect whose state was not persisted.

use super::DbPool;
use crate::game::TableState;
use chrono::Utc;

pub async fn save(pool: &DbPool, state: &TableState) -> Result<(), sqlx::Error> {
    let json = serde_json::to_string(state).map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
    sqlx::query(
        "INSERT INTO table_snapshots (table_id, state, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(table_id) DO UPDATE SET
             state = excluded.state,
             updated_at = excluded.updated_at",
    )
    .bind(&state.table_id)
    .bind(&json)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn load_all(pool: &DbPool) -> Result<Vec<TableState>, sqlx::Error> {
    let rows: Vec<String> = sqlx::query_scalar("SELECT state FROM table_snapshots")
        .fetch_all(pool)
        .await?;
    Ok(rows
        .iter()
        .filter_map(|json| match serde_json::from_str(json) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::error!("Dropping unreadable table snapshot: {e}");
                None
            }
        })
        .collect())
}

pub async fn delete(pool: &DbPool, table_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM table_snapshots WHERE table_id = ?")
        .bind(table_id)
        .execute(pool)
        .await?;
    Ok(())
}
