//! Module that plays rounds of blackjack at a single table. In other words, this module provides
//! everything needed to run one game: the seated players, the dealer and the round engine.

pub mod player;
pub mod strategy;
pub mod table;
pub mod prelude {
    pub use super::{BlackjackGame, PlayerOutcome, RoundReport};
    pub use crate::game::player::{Dealer, Player, DEALER_NAME};
    pub use crate::game::strategy;
    pub use crate::game::table::{BlackjackTable, HandResult};
    pub use blackjack_lib::{BlackjackGameError, Card, Chips, Deck, Hand};
}

pub use prelude::*;
use strategy::Action;
use tracing::{debug, warn};

/// What happened to one player during a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOutcome {
    pub name: String,
    pub result: HandResult,
    /// The accepted bet, `None` when the player could not cover their bet and sat out.
    pub bet: Option<Chips>,
    /// Net chip change from settlement, `None` for players that sat out.
    pub net: Option<Chips>,
}

/// Summary of a completed round, in seating order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    pub outcomes: Vec<PlayerOutcome>,
    pub dealer_value: u8,
    pub dealer_chips: Chips,
}

/// A single table game. Owns the deck, the dealer and every seated player, so a game can be
/// moved onto its own thread and played without sharing any state.
pub struct BlackjackGame {
    table: BlackjackTable,
    players: Vec<Player>,
}

impl BlackjackGame {
    pub fn new(dealer: Dealer) -> BlackjackGame {
        BlackjackGame {
            table: BlackjackTable::new(dealer),
            players: Vec::new(),
        }
    }

    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn dealer(&self) -> &Dealer {
        &self.table.dealer
    }

    /// Starts a new round: clears every hand, replaces the deck if it runs low, shuffles and
    /// deals two cards to every player and the dealer.
    pub fn start_round(&mut self) -> Result<(), BlackjackGameError> {
        self.clear_hands();
        self.table.refresh_deck(self.players.len());
        self.deal_initial_cards()
    }

    pub fn clear_hands(&mut self) {
        for player in self.players.iter_mut() {
            player.hand.clear();
        }
        self.table.dealer.hand.clear();
    }

    /// Deals one card to each player then one to the dealer, twice, from the deck as it is.
    pub fn deal_initial_cards(&mut self) -> Result<(), BlackjackGameError> {
        for _ in 0..2 {
            for player in self.players.iter_mut() {
                let card = self.table.deal_card()?;
                player.hand.add_card(card);
            }
            let card = self.table.deal_card()?;
            self.table.dealer.hand.add_card(card);
        }
        Ok(())
    }

    /// Plays out a dealt round: bets, player turns, the dealer's turn, then resolution and
    /// settlement. `start_round` must have been called first.
    pub fn play_round(&mut self) -> Result<RoundReport, BlackjackGameError> {
        let bets = self.take_bets();
        let dealers_up_card = self.table.dealers_up_card()?;

        for player in self.players.iter_mut() {
            debug!(player = %player.name, hand = %player.hand, "player's turn");
            loop {
                let action = player.decide_action(dealers_up_card);
                debug!(player = %player.name, %action, "decision");
                if action == Action::Stand {
                    break;
                }
                let card = self.table.deal_card()?;
                player.hand.add_card(card);
                debug!(player = %player.name, hand = %player.hand, "new hand");
                if player.hand.is_bust() {
                    debug!(player = %player.name, value = player.hand.value(), "bust");
                    break;
                }
            }
        }

        debug!(hand = %self.table.dealer.hand, "dealer's turn");
        self.table.play_dealer_turn()?;

        let results: Vec<HandResult> = self
            .players
            .iter()
            .map(|player| self.table.resolve(&player.hand))
            .collect();

        let mut outcomes = Vec::with_capacity(self.players.len());
        for ((player, result), bet) in self.players.iter_mut().zip(results).zip(bets) {
            let net = bet.map(|_| self.table.settle(player, result));
            debug!(player = %player.name, %result, chips = player.chips, "round result");
            outcomes.push(PlayerOutcome {
                name: player.name.clone(),
                result,
                bet,
                net,
            });
        }

        debug!(chips = self.table.dealer.chips, "dealer's remaining chips");
        Ok(RoundReport {
            outcomes,
            dealer_value: self.table.dealer.hand.value(),
            dealer_chips: self.table.dealer.chips,
        })
    }

    /// Asks every player for a bet in seating order. Bets a player cannot cover are turned down
    /// and that player sits out settlement.
    fn take_bets(&mut self) -> Vec<Option<Chips>> {
        self.players
            .iter_mut()
            .map(|player| {
                let bet = player.decide_bet();
                match player.place_bet(bet) {
                    Ok(()) => {
                        debug!(player = %player.name, bet, "bet placed");
                        Some(bet)
                    }
                    Err(e) => {
                        warn!(player = %player.name, error = %e, "bet declined");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use blackjack_lib::{Rank, Suit};
    use strategy::{BasicStrategy, StandOnSeventeen, Strategy, TableState};

    impl RoundReport {
        fn outcome(&self, name: &str) -> Option<&PlayerOutcome> {
            self.outcomes.iter().find(|o| o.name == name)
        }
    }

    impl BlackjackGame {
        /// Stacks the next cards to be dealt.
        fn stack_deck(&mut self, draw_order: Vec<Card>) {
            self.table.replace_deck(Deck::stacked(draw_order));
        }
    }

    fn card(rank: Rank) -> Card {
        Card::new(rank, Suit::Spades)
    }

    fn game_with(players: Vec<(&str, Chips)>) -> BlackjackGame {
        let mut game = BlackjackGame::new(Dealer::new(5000, Box::new(StandOnSeventeen)));
        for (name, chips) in players {
            game.add_player(Player::new(name, chips, Box::new(BasicStrategy::new())));
        }
        game
    }

    /// Bets a fixed amount and always stands.
    struct FlatStand(Chips);

    impl Strategy for FlatStand {
        fn decide_bet(&self, _chips: Chips) -> Chips {
            self.0
        }

        fn decide_action(&self, _state: &TableState<'_>) -> Action {
            Action::Stand
        }

        fn label(&self) -> String {
            "flat stand".to_string()
        }
    }

    #[test]
    fn deal_is_interleaved() {
        let mut game = game_with(vec![("A", 1000), ("B", 1000)]);
        game.stack_deck(
            [Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven]
                .iter()
                .map(|&r| card(r))
                .collect(),
        );
        game.deal_initial_cards().unwrap();
        assert_eq!(game.players()[0].hand.cards(), &[card(Rank::Two), card(Rank::Five)]);
        assert_eq!(game.players()[1].hand.cards(), &[card(Rank::Three), card(Rank::Six)]);
        assert_eq!(game.dealer().hand.cards(), &[card(Rank::Four), card(Rank::Seven)]);
    }

    #[test]
    fn bust_and_stand_against_dealer_nineteen() {
        // A: 10 + 6, hits a king and busts. B: king + queen, stands on 20.
        // Dealer: 10 + 5, draws a 4 to reach 19.
        let mut game = game_with(vec![("A", 1000), ("B", 1000)]);
        game.stack_deck(vec![
            card(Rank::Ten),
            card(Rank::King),
            Card::new(Rank::Ten, Suit::Hearts),
            card(Rank::Six),
            card(Rank::Queen),
            Card::new(Rank::Five, Suit::Hearts),
            Card::new(Rank::King, Suit::Diamonds),
            Card::new(Rank::Four, Suit::Hearts),
        ]);
        game.deal_initial_cards().unwrap();

        let report = game.play_round().unwrap();

        let a = report.outcome("A").unwrap();
        let b = report.outcome("B").unwrap();
        assert_eq!(a.result, HandResult::Bust);
        assert_eq!(b.result, HandResult::Win);
        assert_eq!(report.dealer_value, 19);

        // Both bet 15% of 1000.
        assert_eq!(a.bet, Some(150));
        assert_eq!(a.net, Some(-150));
        assert_eq!(b.net, Some(150));
        assert_eq!(game.players()[0].chips, 850);
        assert_eq!(game.players()[1].chips, 1150);
        assert_eq!(report.dealer_chips, 5000 + 150 - 150);
    }

    #[test]
    fn player_blackjack_is_paid_three_to_two() {
        let mut game = BlackjackGame::new(Dealer::new(5000, Box::new(StandOnSeventeen)));
        game.add_player(Player::new("A", 1000, Box::new(FlatStand(100))));
        game.stack_deck(vec![
            card(Rank::Ace),
            card(Rank::Ten),
            card(Rank::King),
            card(Rank::Eight),
        ]);
        game.deal_initial_cards().unwrap();

        let report = game.play_round().unwrap();
        assert_eq!(report.outcomes[0].result, HandResult::Win);
        assert_eq!(report.outcomes[0].net, Some(150));
        assert_eq!(game.players()[0].chips, 1150);
        assert_eq!(game.dealer().chips, 4850);
    }

    #[test]
    fn declined_player_plays_but_is_not_settled() {
        let mut game = BlackjackGame::new(Dealer::new(5000, Box::new(StandOnSeventeen)));
        game.add_player(Player::new("broke", 5, Box::new(BasicStrategy::new())));
        game.add_player(Player::new("flush", 1000, Box::new(FlatStand(100))));
        game.stack_deck(vec![
            card(Rank::King),
            card(Rank::Nine),
            card(Rank::Ten),
            card(Rank::Queen),
            card(Rank::Eight),
            card(Rank::Eight),
        ]);
        game.deal_initial_cards().unwrap();

        let report = game.play_round().unwrap();
        let broke = report.outcome("broke").unwrap();
        assert_eq!(broke.bet, None);
        assert_eq!(broke.net, None);
        assert_eq!(broke.result, HandResult::Win);
        assert_eq!(game.players()[0].chips, 5);

        let flush = report.outcome("flush").unwrap();
        assert_eq!(flush.result, HandResult::Lose);
        assert_eq!(flush.net, Some(-100));
        assert_eq!(game.dealer().chips, 5100);
    }

    #[test]
    fn play_round_needs_a_deal() {
        let mut game = game_with(vec![("A", 1000)]);
        assert_eq!(game.play_round(), Err(BlackjackGameError::RoundNotStarted));
    }

    #[test]
    fn running_out_of_cards_is_an_error() {
        let mut game = game_with(vec![("A", 1000)]);
        game.stack_deck(vec![card(Rank::Two); 3]);
        assert_eq!(game.deal_initial_cards(), Err(BlackjackGameError::EmptyDeck));
    }

    #[test]
    fn many_rounds_keep_the_books_balanced() {
        let mut game = game_with(vec![("A", 1000), ("B", 1000), ("C", 1000)]);
        for _ in 0..200 {
            game.start_round().unwrap();
            match game.play_round() {
                Ok(_) => {}
                // The deck is only topped up between rounds, a long round can still run dry.
                Err(BlackjackGameError::EmptyDeck) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
            assert!(game.players().iter().all(|p| p.current_bet == 0));
            assert!(game.players().iter().all(|p| p.chips >= 0));
            let total: Chips =
                game.players().iter().map(|p| p.chips).sum::<Chips>() + game.dealer().chips;
            assert_eq!(total, 3 * 1000 + 5000);
        }
    }
}
