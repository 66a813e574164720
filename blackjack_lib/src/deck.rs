use crate::card::{Card, Rank, Suit};
use crate::error::BlackjackGameError;
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of cards in a fresh deck.
pub const DECK_SIZE: usize = 52;

/// A single 52 card deck. Cards are drawn from the back of `cards`.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Associated function returning a fresh, unshuffled deck with one card for every suit and rank.
    pub fn new() -> Deck {
        let cards = Suit::ALL
            .iter()
            .flat_map(|&suit| Rank::ALL.iter().map(move |&rank| Card::new(rank, suit)))
            .collect();
        Deck { cards }
    }

    /// Builds a deck that deals `draw_order` front to back. Meant for setting up known hands.
    pub fn stacked(mut draw_order: Vec<Card>) -> Deck {
        draw_order.reverse();
        Deck { cards: draw_order }
    }

    /// Shuffles the remaining cards with the thread local rng.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes and returns the top card, fails with `EmptyDeck` once every card has been dealt.
    pub fn draw(&mut self) -> Result<Card, BlackjackGameError> {
        self.cards.pop().ok_or(BlackjackGameError::EmptyDeck)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::new()
    }
}
