use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An agent's row in the identity store. Chip balances here are
/// authoritative; table stacks are a cache written back on every commit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub chips: i64,
    pub hands_played: i64,
    pub hands_won: i64,
    pub llm_provider: Option<String>,
    pub llm_model: Option<String>,
    pub created_at: String,
    pub banned: bool,
    pub current_table: Option<String>,
    pub rebuys: i64,
}

impl Agent {
    pub fn new(
        name: String,
        api_key_hash: String,
        starting_chips: i64,
        llm_provider: Option<String>,
        llm_model: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            api_key_hash,
            chips: starting_chips,
            hands_played: 0,
            hands_won: 0,
            llm_provider,
            llm_model,
            created_at: Utc::now().to_rfc3339(),
            banned: false,
            current_table: None,
            rebuys: 0,
        }
    }
}

/// One archived hand summary row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HandSummary {
    pub id: String,
    pub table_id: String,
    pub winner_id: Option<String>,
    pub winner_name: Option<String>,
    pub winning_hand: Option<String>,
    pub pot: i64,
    pub player_count: i64,
    pub started_at: i64,
    pub ended_at: i64,
}

/// One stored pair-statistics row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PairRow {
    pub agent_a: String,
    pub agent_b: String,
    pub hands_together: i64,
    pub a_folds_to_b: i64,
    pub b_folds_to_a: i64,
    pub chip_flow_a_to_b: i64,
    pub collusion_score: f64,
    pub last_updated: String,
}
