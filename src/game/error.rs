//! Typed errors for engine operations.
//!
//! Every transition either commits or returns one of these; the actor never
//! swallows them and the gateway maps them onto HTTP statuses.

use std::fmt;

/// Errors that can occur during game operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    // Seating errors
    TableFull,
    AlreadySeated,
    NotSeated,
    InsufficientBuyIn { required: i64, available: i64 },
    InHandCannotLeave,

    // Action errors
    NotYourTurn,
    CannotAct,
    BetToMatch { current_bet: i64 },
    BelowMinRaise { minimum: i64, attempted: i64 },
    InsufficientChips { required: i64, available: i64 },
    UnknownAction { action: String },

    // Hand lifecycle errors
    HandInProgress,
    HandNotInProgress,

    // Deck errors (programming errors; must not occur in well-formed flows)
    DeckExhausted { requested: usize, remaining: usize },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::TableFull => write!(f, "Table is full"),
            GameError::AlreadySeated => write!(f, "You are already seated at this table"),
            GameError::NotSeated => write!(f, "You are not seated at this table"),
            GameError::InsufficientBuyIn {
                required,
                available,
            } => write!(
                f,
                "Buy-in too small: need {} chips, you have {}",
                required, available
            ),
            GameError::InHandCannotLeave => {
                write!(f, "Cannot leave while in a hand")
            }
            GameError::NotYourTurn => write!(f, "Not your turn"),
            GameError::CannotAct => write!(f, "You cannot act"),
            GameError::BetToMatch { current_bet } => {
                write!(f, "Cannot check, there is a bet of {} to match", current_bet)
            }
            GameError::BelowMinRaise { minimum, attempted } => write!(
                f,
                "Raise to {} is below the minimum raise of {}",
                attempted, minimum
            ),
            GameError::InsufficientChips {
                required,
                available,
            } => write!(
                f,
                "Not enough chips: need {}, you have {}",
                required, available
            ),
            GameError::UnknownAction { action } => write!(f, "Unknown action: {}", action),
            GameError::HandInProgress => {
                write!(f, "Only allowed between hands")
            }
            GameError::HandNotInProgress => write!(f, "No hand in progress"),
            GameError::DeckExhausted {
                requested,
                remaining,
            } => write!(
                f,
                "Deck exhausted: requested {} cards with {} remaining",
                requested, remaining
            ),
        }
    }
}

impl std::error::Error for GameError {}

/// Result type for game operations
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GameError::BelowMinRaise {
            minimum: 80,
            attempted: 50,
        };
        assert_eq!(
            err.to_string(),
            "Raise to 50 is below the minimum raise of 80"
        );
        assert_eq!(GameError::NotYourTurn.to_string(), "Not your turn");
    }

    #[test]
    fn error_equality() {
        assert_eq!(GameError::TableFull, GameError::TableFull);
        assert_ne!(GameError::TableFull, GameError::NotYourTurn);
    }
}
