use crate::game::strategy::{Action, DealerStrategy, Strategy, TableState};
use blackjack_lib::{BlackjackGameError, Card, Chips, Hand};
use std::fmt::Display;

/// Name under which the dealer appears in statistics and reports.
pub const DEALER_NAME: &str = "Dealer";

/// Net winnings on a won bet: 3 to 2 for a blackjack, even money otherwise, rounded down.
pub fn winnings(bet: Chips, blackjack: bool) -> Chips {
    if blackjack {
        bet * 3 / 2
    } else {
        bet
    }
}

/// A seated player: a chip ledger, the current hand and the strategy making its decisions.
pub struct Player {
    pub name: String,
    pub chips: Chips,
    pub hand: Hand,
    pub current_bet: Chips,
    strategy: Box<dyn Strategy>,
}

impl Player {
    /// Associated function to create a new `Player` with `chips` in front of them.
    pub fn new(name: impl Into<String>, chips: Chips, strategy: Box<dyn Strategy>) -> Player {
        Player {
            name: name.into(),
            chips,
            hand: Hand::new(),
            current_bet: 0,
            strategy,
        }
    }

    /// The bet the player's strategy wants to make this round.
    pub fn decide_bet(&self) -> Chips {
        self.strategy.decide_bet(self.chips)
    }

    /// The strategy's choice for the current hand.
    pub fn decide_action(&self, dealers_up_card: Card) -> Action {
        let state = TableState::new(&self.hand, self.chips, dealers_up_card);
        self.strategy.decide_action(&state)
    }

    /// Moves `amount` from the balance onto the table. Fails without touching the ledger when
    /// the balance does not cover it.
    pub fn place_bet(&mut self, amount: Chips) -> Result<(), BlackjackGameError> {
        if amount > self.chips {
            return Err(BlackjackGameError::InsufficientFunds {
                bet: amount,
                chips: self.chips,
            });
        }
        self.current_bet = amount;
        self.chips -= amount;
        Ok(())
    }

    /// Pays out the current bet plus winnings and returns the winnings, which the house covers.
    pub fn win_bet(&mut self, blackjack: bool) -> Chips {
        let won = winnings(self.current_bet, blackjack);
        self.chips += self.current_bet + won;
        self.current_bet = 0;
        won
    }

    /// Forfeits the current bet and returns the amount lost to the house.
    pub fn lose_bet(&mut self) -> Chips {
        let lost = self.current_bet;
        self.current_bet = 0;
        lost
    }

    /// Returns the current bet to the balance.
    pub fn push_bet(&mut self) {
        self.chips += self.current_bet;
        self.current_bet = 0;
    }

    pub fn label(&self) -> String {
        self.strategy.label()
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<21}{}\n\
             {:<21}{}\n\
             {:<21}{}\n\
             {:<21}{}\n\
             {:<21}{}",
            "name:",
            self.name,
            "hand:",
            self.hand,
            "hand_value:",
            self.hand.value(),
            "bet:",
            self.current_bet,
            "chips:",
            self.chips,
        )
    }
}

/// The house. Holds the bank and a hand, never bets.
pub struct Dealer {
    pub chips: Chips,
    pub hand: Hand,
    strategy: Box<dyn DealerStrategy>,
}

impl Dealer {
    pub fn new(chips: Chips, strategy: Box<dyn DealerStrategy>) -> Dealer {
        Dealer {
            chips,
            hand: Hand::new(),
            strategy,
        }
    }

    pub fn name(&self) -> &'static str {
        DEALER_NAME
    }

    pub fn should_hit(&self) -> bool {
        self.strategy.should_hit(&self.hand)
    }

    /// The dealer's face up card, the first card dealt this round.
    pub fn up_card(&self) -> Option<Card> {
        self.hand.first_card()
    }

    pub fn label(&self) -> String {
        self.strategy.label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::strategy::{BasicStrategy, StandOnSeventeen};

    fn player(chips: Chips) -> Player {
        Player::new("tester", chips, Box::new(BasicStrategy::new()))
    }

    #[test]
    fn bet_moves_chips_onto_the_table() {
        let mut p = player(1000);
        p.place_bet(100).unwrap();
        assert_eq!(p.chips, 900);
        assert_eq!(p.current_bet, 100);
    }

    #[test]
    fn bet_over_balance_is_refused() {
        let mut p = player(5);
        assert_eq!(
            p.place_bet(10),
            Err(BlackjackGameError::InsufficientFunds { bet: 10, chips: 5 })
        );
        assert_eq!(p.chips, 5);
        assert_eq!(p.current_bet, 0);
    }

    #[test]
    fn whole_balance_can_be_bet() {
        let mut p = player(10);
        assert!(p.place_bet(10).is_ok());
        assert_eq!(p.chips, 0);
    }

    #[test]
    fn blackjack_win_returns_two_and_a_half_times_the_bet() {
        let mut p = player(1000);
        p.place_bet(100).unwrap();
        assert_eq!(p.win_bet(true), 150);
        assert_eq!(p.chips, 900 + 250);
        assert_eq!(p.current_bet, 0);
    }

    #[test]
    fn normal_win_returns_double_the_bet() {
        let mut p = player(1000);
        p.place_bet(100).unwrap();
        assert_eq!(p.win_bet(false), 100);
        assert_eq!(p.chips, 1100);
    }

    #[test]
    fn odd_blackjack_payout_rounds_down() {
        let mut p = player(1000);
        p.place_bet(45).unwrap();
        assert_eq!(p.win_bet(true), 67);
        assert_eq!(p.chips, 1000 + 67);
    }

    #[test]
    fn loss_leaves_post_bet_balance() {
        let mut p = player(1000);
        p.place_bet(100).unwrap();
        assert_eq!(p.lose_bet(), 100);
        assert_eq!(p.chips, 900);
        assert_eq!(p.current_bet, 0);
    }

    #[test]
    fn push_restores_pre_bet_balance() {
        let mut p = player(1000);
        p.place_bet(100).unwrap();
        p.push_bet();
        assert_eq!(p.chips, 1000);
        assert_eq!(p.current_bet, 0);
    }

    #[test]
    fn dealer_has_no_up_card_before_the_deal() {
        let dealer = Dealer::new(5000, Box::new(StandOnSeventeen));
        assert_eq!(dealer.up_card(), None);
        assert!(dealer.should_hit());
        assert_eq!(dealer.name(), "Dealer");
    }
}
