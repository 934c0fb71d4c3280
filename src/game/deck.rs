use super::error::{GameError, GameResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

const RANK_CHARS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];
const SUIT_CHARS: [char; 4] = ['h', 'd', 'c', 's'];

/// A playing card. Ranks run 2..=14 (Ten=10, Jack=11, Queen=12, King=13,
/// Ace=14); suits are 0=hearts, 1=diamonds, 2=clubs, 3=spades.
///
/// Cards cross the wire as two-character strings like `"Ah"` or `"Tc"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: u8,
    pub suit: u8,
}

impl Card {
    pub fn new(rank: u8, suit: u8) -> Self {
        debug_assert!((2..=14).contains(&rank));
        debug_assert!(suit < 4);
        Self { rank, suit }
    }

    /// Parse a two-character card string like "Ah" or "9s".
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let rank_ch = chars.next()?;
        let suit_ch = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        let rank = RANK_CHARS
            .iter()
            .position(|&c| c == rank_ch.to_ascii_uppercase())? as u8
            + 2;
        let suit = SUIT_CHARS
            .iter()
            .position(|&c| c == suit_ch.to_ascii_lowercase())? as u8;
        Some(Self { rank, suit })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            RANK_CHARS[(self.rank - 2) as usize],
            SUIT_CHARS[self.suit as usize]
        )
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CardVisitor;

        impl Visitor<'_> for CardVisitor {
            type Value = Card;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a two-character card string like \"Ah\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Card, E> {
                Card::parse(v).ok_or_else(|| E::custom(format!("invalid card: {v:?}")))
            }
        }

        deserializer.deserialize_str(CardVisitor)
    }
}

/// The remaining deck for a hand. Dealing always takes the prefix and never
/// reorders what is left.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard()
    }
}

impl Deck {
    /// The 52 cards in canonical order.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in 0..4 {
            for rank in 2..=14 {
                cards.push(Card::new(rank, suit));
            }
        }
        Self { cards }
    }

    /// Fisher-Yates shuffle with a ChaCha20 CSPRNG; every swap index is
    /// drawn uniformly from `[0, i]`.
    pub fn shuffle(&mut self) {
        let mut rng = ChaCha20Rng::from_entropy();
        self.cards.shuffle(&mut rng);
    }

    /// A freshly shuffled 52-card deck.
    pub fn shuffled() -> Self {
        let mut deck = Self::standard();
        deck.shuffle();
        deck
    }

    /// Deal `n` cards off the top. The tail keeps its order.
    pub fn deal(&mut self, n: usize) -> GameResult<Vec<Card>> {
        if n > self.cards.len() {
            return Err(GameError::DeckExhausted {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    /// Deal a single card.
    pub fn deal_one(&mut self) -> GameResult<Card> {
        Ok(self.deal(1)?[0])
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    /// The remaining cards, for invariant checks.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
