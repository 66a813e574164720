//! Core building blocks for a game of blackjack: cards, a single 52 card deck, hand valuation
//! and the errors that can occur while dealing.

pub mod card;
pub mod deck;
pub mod error;
pub mod hand;

pub use card::{Card, Rank, Suit};
pub use deck::Deck;
pub use error::BlackjackGameError;
pub use hand::{hand_value, Hand};

/// Chip amounts, shared by balances and bets. Signed since the house bank may run negative.
pub type Chips = i64;

pub mod prelude {
    pub use super::{hand_value, BlackjackGameError, Card, Chips, Deck, Hand, Rank, Suit};
}
