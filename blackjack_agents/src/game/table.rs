use crate::game::player::{Dealer, Player};
use blackjack_lib::{BlackjackGameError, Card, Chips, Deck, Hand};
use std::fmt::Display;
use tracing::debug;

/// Cards needed per seat (dealer included) before a round may start on the current deck.
pub const CARDS_PER_SEAT: usize = 4;

/// Outcome of a single player's hand against the dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandResult {
    Win,
    Lose,
    Push,
    Bust,
}

impl Display for HandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HandResult::Win => "WIN",
            HandResult::Lose => "LOSE",
            HandResult::Push => "PUSH",
            HandResult::Bust => "BUST",
        };
        write!(f, "{}", s)
    }
}

/// Decides a player's hand against the dealer's final hand. Busting loses before the dealer's
/// hand is looked at, then naturals are compared, then totals.
pub fn resolve_hand(player: &Hand, dealer: &Hand) -> HandResult {
    if player.is_bust() {
        return HandResult::Bust;
    }
    if dealer.is_bust() {
        return HandResult::Win;
    }

    match (player.is_blackjack(), dealer.is_blackjack()) {
        (true, false) => return HandResult::Win,
        (false, true) => return HandResult::Lose,
        (true, true) => return HandResult::Push,
        (false, false) => {}
    }

    let (player_value, dealer_value) = (player.value(), dealer.value());
    if player_value > dealer_value {
        HandResult::Win
    } else if player_value < dealer_value {
        HandResult::Lose
    } else {
        HandResult::Push
    }
}

/// The table: the deck in play and the dealer. Handles dealing, the dealer's turn and moving
/// chips between players and the house.
pub struct BlackjackTable {
    deck: Deck,
    pub dealer: Dealer,
}

impl BlackjackTable {
    pub fn new(dealer: Dealer) -> BlackjackTable {
        BlackjackTable {
            deck: Deck::new(),
            dealer,
        }
    }

    /// Replaces the deck in play, e.g. with a stacked deck.
    pub fn replace_deck(&mut self, deck: Deck) {
        self.deck = deck;
    }

    pub fn cards_remaining(&self) -> usize {
        self.deck.len()
    }

    /// Swaps in a fresh deck when fewer than `(num_players + 1) * CARDS_PER_SEAT` cards are
    /// left, then shuffles whatever deck is in play.
    pub fn refresh_deck(&mut self, num_players: usize) {
        let needed = (num_players + 1) * CARDS_PER_SEAT;
        if self.deck.len() < needed {
            debug!(remaining = self.deck.len(), needed, "replacing deck");
            self.deck = Deck::new();
        }
        self.deck.shuffle();
    }

    pub fn deal_card(&mut self) -> Result<Card, BlackjackGameError> {
        self.deck.draw()
    }

    /// Getter for the dealer's face up card.
    pub fn dealers_up_card(&self) -> Result<Card, BlackjackGameError> {
        self.dealer.up_card().ok_or(BlackjackGameError::RoundNotStarted)
    }

    /// Draws for the dealer for as long as its strategy asks for cards.
    pub fn play_dealer_turn(&mut self) -> Result<(), BlackjackGameError> {
        while self.dealer.should_hit() {
            let card = self.deck.draw()?;
            self.dealer.hand.add_card(card);
            debug!(hand = %self.dealer.hand, value = self.dealer.hand.value(), "dealer hits");
        }
        Ok(())
    }

    pub fn resolve(&self, hand: &Hand) -> HandResult {
        resolve_hand(hand, &self.dealer.hand)
    }

    /// Settles `player`'s outstanding bet for `result` and returns the player's net change
    /// relative to their balance before betting.
    pub fn settle(&mut self, player: &mut Player, result: HandResult) -> Chips {
        match result {
            HandResult::Win => {
                let won = player.win_bet(player.hand.is_blackjack());
                self.dealer.chips -= won;
                debug!(player = %player.name, won, "player wins");
                won
            }
            HandResult::Lose | HandResult::Bust => {
                let lost = player.lose_bet();
                self.dealer.chips += lost;
                debug!(player = %player.name, lost, "player loses");
                -lost
            }
            HandResult::Push => {
                player.push_bet();
                debug!(player = %player.name, "bet returned");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::strategy::{BasicStrategy, StandOnSeventeen};
    use blackjack_lib::{Rank, Suit};

    fn hand(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|&r| Card::new(r, Suit::Diamonds)).collect())
    }

    fn table() -> BlackjackTable {
        BlackjackTable::new(Dealer::new(5000, Box::new(StandOnSeventeen)))
    }

    fn seated(ranks: &[Rank], bet: Chips) -> Player {
        let mut player = Player::new("p", 1000, Box::new(BasicStrategy::new()));
        player.hand = hand(ranks);
        player.place_bet(bet).unwrap();
        player
    }

    #[test]
    fn bust_player_loses_even_if_dealer_busts() {
        let result = resolve_hand(
            &hand(&[Rank::King, Rank::Six, Rank::Nine]),
            &hand(&[Rank::King, Rank::Five, Rank::Queen]),
        );
        assert_eq!(result, HandResult::Bust);
    }

    #[test]
    fn dealer_bust_pays_standing_players() {
        let result = resolve_hand(
            &hand(&[Rank::Two, Rank::Three]),
            &hand(&[Rank::King, Rank::Five, Rank::Queen]),
        );
        assert_eq!(result, HandResult::Win);
    }

    #[test]
    fn naturals_beat_three_card_twenty_one() {
        let natural = hand(&[Rank::Ace, Rank::King]);
        let three_card = hand(&[Rank::Seven, Rank::Seven, Rank::Seven]);
        assert_eq!(resolve_hand(&natural, &three_card), HandResult::Win);
        assert_eq!(resolve_hand(&three_card, &natural), HandResult::Lose);
        assert_eq!(resolve_hand(&natural, &natural), HandResult::Push);
    }

    #[test]
    fn totals_decide_the_rest() {
        let twenty = hand(&[Rank::King, Rank::Queen]);
        let nineteen = hand(&[Rank::King, Rank::Nine]);
        assert_eq!(resolve_hand(&twenty, &nineteen), HandResult::Win);
        assert_eq!(resolve_hand(&nineteen, &twenty), HandResult::Lose);
        assert_eq!(resolve_hand(&twenty, &twenty), HandResult::Push);
    }

    #[test]
    fn blackjack_win_is_paid_three_to_two() {
        let mut table = table();
        let mut player = seated(&[Rank::Ace, Rank::King], 100);
        assert_eq!(table.settle(&mut player, HandResult::Win), 150);
        assert_eq!(player.chips, 1150);
        assert_eq!(table.dealer.chips, 4850);
    }

    #[test]
    fn normal_win_is_paid_even_money() {
        let mut table = table();
        let mut player = seated(&[Rank::King, Rank::Queen], 100);
        assert_eq!(table.settle(&mut player, HandResult::Win), 100);
        assert_eq!(player.chips, 1100);
        assert_eq!(table.dealer.chips, 4900);
    }

    #[test]
    fn loss_goes_to_the_house() {
        let mut table = table();
        let mut player = seated(&[Rank::King, Rank::Seven], 100);
        assert_eq!(table.settle(&mut player, HandResult::Lose), -100);
        assert_eq!(player.chips, 900);
        assert_eq!(table.dealer.chips, 5100);

        let mut buster = seated(&[Rank::King, Rank::Seven, Rank::Nine], 100);
        assert_eq!(table.settle(&mut buster, HandResult::Bust), -100);
        assert_eq!(table.dealer.chips, 5200);
    }

    #[test]
    fn push_returns_the_bet() {
        let mut table = table();
        let mut player = seated(&[Rank::King, Rank::Seven], 100);
        assert_eq!(table.settle(&mut player, HandResult::Push), 0);
        assert_eq!(player.chips, 1000);
        assert_eq!(table.dealer.chips, 5000);
    }

    #[test]
    fn dealer_draws_to_seventeen() {
        let mut table = table();
        table.dealer.hand = hand(&[Rank::Ten, Rank::Two]);
        table.replace_deck(Deck::stacked(vec![
            Card::new(Rank::Three, Suit::Clubs),
            Card::new(Rank::Four, Suit::Clubs),
            Card::new(Rank::King, Suit::Clubs),
        ]));
        table.play_dealer_turn().unwrap();
        assert_eq!(table.dealer.hand.value(), 19);
        assert_eq!(table.cards_remaining(), 1);
    }

    #[test]
    fn dealer_turn_on_empty_deck_fails() {
        let mut table = table();
        table.dealer.hand = hand(&[Rank::Ten, Rank::Two]);
        table.replace_deck(Deck::stacked(vec![]));
        assert_eq!(table.play_dealer_turn(), Err(BlackjackGameError::EmptyDeck));
    }

    #[test]
    fn deck_is_replaced_below_threshold() {
        let mut table = table();
        table.replace_deck(Deck::stacked(vec![Card::new(Rank::Two, Suit::Clubs); 11]));
        table.refresh_deck(2);
        assert_eq!(table.cards_remaining(), 52);

        table.replace_deck(Deck::stacked(vec![Card::new(Rank::Two, Suit::Clubs); 12]));
        table.refresh_deck(2);
        assert_eq!(table.cards_remaining(), 12);
    }

    #[test]
    fn no_up_card_before_the_deal() {
        assert_eq!(table().dealers_up_card(), Err(BlackjackGameError::RoundNotStarted));
    }
}
