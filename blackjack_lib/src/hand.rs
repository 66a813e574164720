use crate::card::Card;
use std::fmt::Display;

/// Computes the blackjack value of `cards`. Non-aces are summed first, then each ace is counted as
/// 11 when that keeps the running total at or under 21 and as 1 otherwise.
pub fn hand_value(cards: &[Card]) -> u8 {
    let (value, _) = evaluate(cards);
    value
}

/// Returns the hand value along with whether an ace is being counted as 11.
fn evaluate(cards: &[Card]) -> (u8, bool) {
    let mut value: u8 = cards
        .iter()
        .filter(|c| !c.is_ace())
        .map(|c| c.val())
        .fold(0u8, |acc, v| acc.saturating_add(v));
    let mut soft = false;

    for _ in cards.iter().filter(|c| c.is_ace()) {
        if value.saturating_add(11) <= 21 {
            value += 11;
            soft = true;
        } else {
            value = value.saturating_add(1);
        }
    }

    (value, soft)
}

/// The cards held by a single participant during one round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Hand {
        Hand { cards: Vec::new() }
    }

    pub fn from_cards(cards: Vec<Card>) -> Hand {
        Hand { cards }
    }

    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The dealer's face up card is simply the first card dealt to the hand.
    pub fn first_card(&self) -> Option<Card> {
        self.cards.first().copied()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn value(&self) -> u8 {
        hand_value(&self.cards)
    }

    /// True when an ace is currently counted as 11.
    pub fn is_soft(&self) -> bool {
        evaluate(&self.cards).1
    }

    pub fn is_bust(&self) -> bool {
        self.value() > 21
    }

    pub fn is_blackjack(&self) -> bool {
        self.len() == 2 && self.value() == 21
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cards = self
            .cards
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "{}", cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{Rank, Suit};

    fn hand(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|&r| Card::new(r, Suit::Clubs)).collect())
    }

    #[test]
    fn hand_without_aces_sums_card_values() {
        let h = hand(&[Rank::King, Rank::Seven, Rank::Two]);
        assert_eq!(h.value(), 19);
        let reversed = hand(&[Rank::Two, Rank::Seven, Rank::King]);
        assert_eq!(reversed.value(), 19);
        assert!(!h.is_soft());
    }

    #[test]
    fn aces_take_the_best_total() {
        assert_eq!(hand(&[Rank::Ace, Rank::Ace, Rank::Nine]).value(), 21);
        assert_eq!(hand(&[Rank::Ace, Rank::Six]).value(), 17);
        assert_eq!(hand(&[Rank::Ace, Rank::Six, Rank::King]).value(), 17);
        assert_eq!(hand(&[Rank::Ace, Rank::Ace, Rank::Ace, Rank::Ace]).value(), 14);
    }

    #[test]
    fn soft_only_while_an_ace_counts_eleven() {
        assert!(hand(&[Rank::Ace, Rank::Seven]).is_soft());
        assert!(!hand(&[Rank::Ace, Rank::Seven, Rank::King]).is_soft());
    }

    #[test]
    fn blackjack_needs_exactly_two_cards() {
        assert!(hand(&[Rank::Ace, Rank::King]).is_blackjack());
        let three_card_21 = hand(&[Rank::Ace, Rank::Five, Rank::Five]);
        assert_eq!(three_card_21.value(), 21);
        assert!(!three_card_21.is_blackjack());
    }

    #[test]
    fn bust_over_twenty_one() {
        let h = hand(&[Rank::King, Rank::Queen, Rank::Two]);
        assert_eq!(h.value(), 22);
        assert!(h.is_bust());
        assert!(!hand(&[Rank::King, Rank::Ace]).is_bust());
    }

    #[test]
    fn value_is_idempotent() {
        let h = hand(&[Rank::Ace, Rank::Ace, Rank::Nine]);
        let before = h.cards().to_vec();
        assert_eq!(h.value(), h.value());
        assert_eq!(h.cards(), before.as_slice());
    }

    #[test]
    fn clear_empties_the_hand() {
        let mut h = hand(&[Rank::Ace, Rank::King]);
        h.clear();
        assert!(h.is_empty());
        assert_eq!(h.value(), 0);
        assert_eq!(h.first_card(), None);
    }
}
