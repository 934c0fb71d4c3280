//! Game-related constants and default configuration values.

/// Maximum number of seats at a table
pub const MAX_SEATS: usize = 6;

/// Minimum players required to start a hand
pub const MIN_PLAYERS_TO_START: usize = 2;

/// Chips granted on registration and restored by a rebuy
pub const STARTING_CHIPS: i64 = 1000;

/// Minimum buy-in, expressed in big blinds
pub const MIN_BUYIN_BB: i64 = 5;

/// Blinds used before the first hand computes dynamic blinds
pub const DEFAULT_SMALL_BLIND: i64 = 10;
pub const DEFAULT_BIG_BLIND: i64 = 20;

/// Floor for the dynamically computed small blind
pub const MIN_SMALL_BLIND: i64 = 10;

/// How long a player has to act before being auto-folded (milliseconds)
pub const ACTION_TIMEOUT_MS: u64 = 15_000;

/// Delay between entering showdown and starting the next hand (milliseconds)
pub const SHOWDOWN_COOLDOWN_MS: u64 = 3_000;

/// Consecutive missed hands before a sitting-out seat is vacated
pub const SIT_OUT_EVICTION_HANDS: u32 = 10;

/// Rebuy rules: allowed while below the threshold, at most MAX_REBUYS times
pub const REBUY_THRESHOLD: i64 = 100;
pub const MAX_REBUYS: i64 = 3;

/// Chat limits
pub const CHAT_MAX_BYTES: usize = 280;
pub const CHAT_VISIBLE_MESSAGES: usize = 10;

/// Hand history query limits
pub const HISTORY_DEFAULT_LIMIT: i64 = 10;
pub const HISTORY_MAX_LIMIT: i64 = 50;

/// Full hand records retained per table
pub const RECORDS_RETAINED_PER_TABLE: i64 = 50;

/// Number of cards dealt per street
pub const HOLE_CARDS: usize = 2;
pub const FLOP_CARDS: usize = 3;
pub const TURN_CARDS: usize = 1;
pub const RIVER_CARDS: usize = 1;
