//! The table registry: creates and restores actors, assigns joins, drives
//! the clock, and fans out post-commit side effects.

use super::{ActionOutcome, TableActor};
use crate::collusion;
use crate::db::{self, DbPool};
use crate::error::{AppError, Result};
use crate::game::{TableState, TableSummary};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct TableManager {
    pool: DbPool,
    tables: RwLock<HashMap<String, Arc<TableActor>>>,
    next_table_no: AtomicU64,
}

impl TableManager {
    /// Restore every persisted table snapshot into a live actor.
    pub async fn load(pool: DbPool) -> anyhow::Result<Self> {
        let snapshots = db::snapshots::load_all(&pool).await?;
        let mut tables = HashMap::new();
        let mut max_no = 0u64;
        for state in snapshots {
            if let Some(n) = state
                .table_id
                .strip_prefix("table-")
                .and_then(|s| s.parse::<u64>().ok())
            {
                max_no = max_no.max(n);
            }
            tracing::info!(
                "Restored table {} ({} seated, phase {:?})",
                state.table_id,
                state.players.len(),
                state.phase
            );
            tables.insert(
                state.table_id.clone(),
                Arc::new(TableActor::new(pool.clone(), state)),
            );
        }
        Ok(Self {
            pool,
            tables: RwLock::new(tables),
            next_table_no: AtomicU64::new(max_no),
        })
    }

    pub async fn get(&self, table_id: &str) -> Option<Arc<TableActor>> {
        self.tables.read().await.get(table_id).cloned()
    }

    /// Create a fresh auto-numbered table. Numbers only grow, so ids are
    /// unique for the process lifetime even after resets.
    pub async fn create_table(&self) -> Arc<TableActor> {
        let no = self.next_table_no.fetch_add(1, Ordering::SeqCst) + 1;
        let table_id = format!("table-{no}");
        tracing::info!("Creating table {table_id}");
        let actor = Arc::new(TableActor::new(
            self.pool.clone(),
            TableState::new(table_id.clone()),
        ));
        self.tables
            .write()
            .await
            .insert(table_id, actor.clone());
        actor
    }

    /// Get or create a table by explicit id (ids are client-visible names,
    /// so they pass the same character rules as agent names).
    pub async fn get_or_create(&self, table_id: &str) -> Result<Arc<TableActor>> {
        if table_id.is_empty()
            || table_id.len() > 32
            || !table_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::Validation(format!(
                "Invalid table id: {table_id}"
            )));
        }
        if let Some(actor) = self.get(table_id).await {
            return Ok(actor);
        }
        let mut tables = self.tables.write().await;
        // Racing creators: first writer wins, second reuses it.
        if let Some(actor) = tables.get(table_id) {
            return Ok(actor.clone());
        }
        let actor = Arc::new(TableActor::new(
            self.pool.clone(),
            TableState::new(table_id.to_string()),
        ));
        tables.insert(table_id.to_string(), actor.clone());
        tracing::info!("Creating table {table_id} by request");
        Ok(actor)
    }

    /// The table to seat a joining agent at: the requested one (created on
    /// demand), else the first open seat, else a brand-new table.
    pub async fn table_for_join(&self, requested: Option<&str>) -> Result<Arc<TableActor>> {
        if let Some(id) = requested {
            return self.get_or_create(id).await;
        }
        let candidates: Vec<Arc<TableActor>> = {
            let tables = self.tables.read().await;
            let mut ids: Vec<&String> = tables.keys().collect();
            ids.sort();
            ids.iter().map(|id| tables[*id].clone()).collect()
        };
        for actor in candidates {
            if actor.has_free_seat().await {
                return Ok(actor);
            }
        }
        Ok(self.create_table().await)
    }

    pub async fn summaries(&self) -> Vec<TableSummary> {
        let actors: Vec<Arc<TableActor>> =
            self.tables.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(actors.len());
        for actor in actors {
            summaries.push(actor.summary().await);
        }
        summaries.sort_by(|a, b| a.table_id.cmp(&b.table_id));
        summaries
    }

    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// One clock tick across every table: fires action timeouts and
    /// post-showdown hand starts, then commits whatever fell out.
    pub async fn tick(&self, now_ms: u64) {
        let actors: Vec<Arc<TableActor>> =
            self.tables.read().await.values().cloned().collect();
        for actor in actors {
            match actor.tick(now_ms).await {
                Ok(outcome) => self.commit_effects(outcome).await,
                Err(e) => {
                    tracing::error!("Tick failed on table {}: {e:?}", actor.table_id)
                }
            }
        }
    }

    /// Post-commit fan-out. Every write here is best-effort: failures are
    /// logged and never roll back the action — the actor snapshot and the
    /// chip rows already written are authoritative.
    pub async fn commit_effects(&self, outcome: ActionOutcome) {
        for (agent_id, chips) in &outcome.chip_syncs {
            if let Err(e) = db::agents::set_chips(&self.pool, agent_id, *chips).await {
                tracing::warn!("Chip write-back failed for {agent_id}: {e}");
            }
        }

        for player in &outcome.evicted {
            if let Err(e) = db::agents::set_chips(&self.pool, &player.agent_id, player.chips).await
            {
                tracing::warn!("Eviction chip write-back failed for {}: {e}", player.agent_id);
            }
            if let Err(e) = db::agents::clear_table(&self.pool, &player.agent_id).await {
                tracing::warn!("Eviction table clear failed for {}: {e}", player.agent_id);
            }
        }

        let record = match &outcome.completed_hand {
            Some(record) => record,
            None => return,
        };

        if let Err(e) = db::hand_history::insert_or_ignore(&self.pool, record).await {
            tracing::warn!("Hand archive insert failed for {}: {e}", record.hand_id);
        }
        if let Err(e) = db::records::store(&self.pool, record).await {
            tracing::warn!("Hand record store failed for {}: {e}", record.hand_id);
        }
        for player in &record.players {
            let won = record.winner_id.as_deref() == Some(player.id.as_str());
            if let Err(e) = db::agents::record_hand_played(&self.pool, &player.id, won).await {
                tracing::warn!("Counter update failed for {}: {e}", player.id);
            }
        }
        for update in collusion::pair_updates(record) {
            if let Err(e) = db::pairs::apply_update(&self.pool, &update).await {
                tracing::warn!(
                    "Collusion update failed for {}/{}: {e}",
                    update.agent_a,
                    update.agent_b
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::{ACTION_TIMEOUT_MS, MAX_SEATS};

    async fn manager() -> TableManager {
        let pool = crate::create_test_db().await;
        TableManager::load(pool).await.unwrap()
    }

    #[tokio::test]
    async fn auto_assignment_fills_then_overflows() {
        let manager = manager().await;
        let first = manager.table_for_join(None).await.unwrap();
        assert_eq!(first.table_id, "table-1");

        for i in 0..MAX_SEATS {
            first
                .join(format!("a{i}"), format!("Agent{i}"), 1000, 0)
                .await
                .unwrap();
        }
        let second = manager.table_for_join(None).await.unwrap();
        assert_eq!(second.table_id, "table-2");
        assert_eq!(manager.table_count().await, 2);
    }

    #[tokio::test]
    async fn requested_tables_are_created_on_demand() {
        let manager = manager().await;
        let main = manager.table_for_join(Some("main")).await.unwrap();
        assert_eq!(main.table_id, "main");
        // Asking again reuses it.
        let again = manager.table_for_join(Some("main")).await.unwrap();
        assert!(Arc::ptr_eq(&main, &again));
        assert!(manager
            .table_for_join(Some("bad table!"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn restored_snapshots_continue_numbering() {
        let pool = crate::create_test_db().await;
        db::snapshots::save(&pool, &TableState::new("table-7".to_string()))
            .await
            .unwrap();

        let manager = TableManager::load(pool).await.unwrap();
        assert!(manager.get("table-7").await.is_some());
        let fresh = manager.create_table().await;
        assert_eq!(fresh.table_id, "table-8");
    }

    #[tokio::test]
    async fn completed_hands_flow_into_archive_counters_and_pairs() {
        let pool = crate::create_test_db().await;
        let manager = TableManager::load(pool.clone()).await.unwrap();

        // Two registered agents sit down; the opener times out and loses.
        for (id, name) in [("a1", "Alice"), ("a2", "Bob")] {
            let mut agent =
                db::models::Agent::new(name.into(), format!("h{id}"), 1000, None, None);
            agent.id = id.to_string();
            db::agents::insert(&pool, &agent).await.unwrap();
        }
        let table = manager.table_for_join(None).await.unwrap();
        table.join("a1".into(), "Alice".into(), 1000, 0).await.unwrap();
        table.join("a2".into(), "Bob".into(), 1000, 0).await.unwrap();
        manager.tick(ACTION_TIMEOUT_MS).await;

        assert_eq!(db::hand_history::count(&pool).await.unwrap(), 1);
        let a1 = db::agents::by_id(&pool, "a1").await.unwrap().unwrap();
        let a2 = db::agents::by_id(&pool, "a2").await.unwrap().unwrap();
        assert_eq!(a1.hands_played, 1);
        assert_eq!(a2.hands_played, 1);
        assert_eq!(a1.hands_won + a2.hands_won, 1);
        // Chips conserved across the identity store.
        assert_eq!(a1.chips + a2.chips, 2000);

        let pair: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM agent_pairs")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(pair, 1);
    }
}
