pub mod constants;
pub mod deck;
pub mod error;
pub mod eval;
pub mod player;
pub mod record;
pub mod table;

pub use deck::{Card, Deck};
pub use error::{GameError, GameResult};
pub use eval::{determine_winners, evaluate_hand, HandCategory, HandRank};
pub use player::{AgentAction, Player, PlayerStatus};
pub use record::{ChatMessage, GameAction, HandRecord};
pub use table::{AgentView, GamePhase, HandResult, PublicView, TableState, TableSummary};
