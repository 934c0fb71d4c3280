//! Identity store operations. Everything here is a single-row conditional
//! statement so concurrent gateways cannot race each other into an
//! inconsistent agent row.

use super::models::Agent;
use super::DbPool;

pub async fn insert(pool: &DbPool, agent: &Agent) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO agents (id, name, api_key_hash, chips, hands_played, hands_won,
                             llm_provider, llm_model, created_at, banned, current_table, rebuys)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&agent.id)
    .bind(&agent.name)
    .bind(&agent.api_key_hash)
    .bind(agent.chips)
    .bind(agent.hands_played)
    .bind(agent.hands_won)
    .bind(&agent.llm_provider)
    .bind(&agent.llm_model)
    .bind(&agent.created_at)
    .bind(agent.banned)
    .bind(&agent.current_table)
    .bind(agent.rebuys)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn by_api_key_hash(pool: &DbPool, hash: &str) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agents WHERE api_key_hash = ?")
        .bind(hash)
        .fetch_optional(pool)
        .await
}

pub async fn by_id(pool: &DbPool, id: &str) -> Result<Option<Agent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agents WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Claim a table seat: succeeds only when the agent is not already at one,
/// which keeps `current_table` single-valued under concurrent joins.
pub async fn claim_table(pool: &DbPool, id: &str, table_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE agents SET current_table = ? WHERE id = ? AND current_table IS NULL",
    )
    .bind(table_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_table(pool: &DbPool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE agents SET current_table = NULL WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Write back an authoritative chip count from a table commit.
pub async fn set_chips(pool: &DbPool, id: &str, chips: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE agents SET chips = ? WHERE id = ?")
        .bind(chips)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Per-hand counter bump; `won` adds to hands_won as well.
pub async fn record_hand_played(pool: &DbPool, id: &str, won: bool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE agents SET hands_played = hands_played + 1,
                           hands_won = hands_won + ?
         WHERE id = ?",
    )
    .bind(i64::from(won))
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Rebuy: reset the stack only while the guard conditions still hold.
/// Returns false when the row no longer qualifies (raced or ineligible).
pub async fn rebuy(
    pool: &DbPool,
    id: &str,
    threshold: i64,
    max_rebuys: i64,
    new_chips: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE agents SET chips = ?, rebuys = rebuys + 1
         WHERE id = ? AND chips < ? AND rebuys < ?",
    )
    .bind(new_chips)
    .bind(id)
    .bind(threshold)
    .bind(max_rebuys)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Top agents by chip count.
pub async fn leaderboard(pool: &DbPool, limit: i64) -> Result<Vec<Agent>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM agents ORDER BY chips DESC, name ASC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
}

/// Global counts for /stats: (agents, total chips in play).
pub async fn totals(pool: &DbPool) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(chips), 0) FROM agents")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pool() -> DbPool {
        crate::create_test_db().await
    }

    fn agent(name: &str) -> Agent {
        Agent::new(name.to_string(), format!("hash_{name}"), 1000, None, None)
    }

    #[tokio::test]
    async fn unique_name_is_enforced_by_the_store() {
        let pool = pool().await;
        insert(&pool, &agent("Leroy")).await.unwrap();
        let err = insert(&pool, &agent("Leroy")).await.unwrap_err();
        assert!(err.to_string().contains("UNIQUE"));
    }

    #[tokio::test]
    async fn claim_table_is_single_valued() {
        let pool = pool().await;
        let a = agent("Alice");
        insert(&pool, &a).await.unwrap();
        assert!(claim_table(&pool, &a.id, "table-1").await.unwrap());
        // A second claim loses until the first is released.
        assert!(!claim_table(&pool, &a.id, "table-2").await.unwrap());
        clear_table(&pool, &a.id).await.unwrap();
        assert!(claim_table(&pool, &a.id, "table-2").await.unwrap());
    }

    #[tokio::test]
    async fn rebuy_guards_hold_in_the_row_update() {
        let pool = pool().await;
        let a = agent("Bob");
        insert(&pool, &a).await.unwrap();
        // Too rich to rebuy.
        assert!(!rebuy(&pool, &a.id, 100, 3, 1000).await.unwrap());
        set_chips(&pool, &a.id, 40).await.unwrap();
        assert!(rebuy(&pool, &a.id, 100, 3, 1000).await.unwrap());
        let row = by_id(&pool, &a.id).await.unwrap().unwrap();
        assert_eq!(row.chips, 1000);
        assert_eq!(row.rebuys, 1);
    }

    #[tokio::test]
    async fn lookup_by_key_hash() {
        let pool = pool().await;
        let a = agent("Carol");
        insert(&pool, &a).await.unwrap();
        let found = by_api_key_hash(&pool, "hash_Carol").await.unwrap();
        assert_eq!(found.unwrap().name, "Carol");
        assert!(by_api_key_hash(&pool, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn leaderboard_orders_by_chips() {
        let pool = pool().await;
        for (name, chips) in [("A", 500), ("B", 2000), ("C", 1000)] {
            let mut ag = agent(name);
            ag.chips = chips;
            insert(&pool, &ag).await.unwrap();
        }
        let top = leaderboard(&pool, 2).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "B");
        assert_eq!(top[1].name, "C");
    }
}
