use crate::llm::{self, prompt, Decision, DecisionService};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

pub mod prelude {
    pub use super::*;
    pub use blackjack_lib::{Card, Chips, Hand};
}

pub use prelude::*;

/// Table minimum. Every strategy clamps its bet to at least this much.
pub const MIN_BET: Chips = 10;

/// The two playing options offered by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Hit,
    Stand,
}

impl Action {
    /// Single character code used when talking to a decision service.
    pub fn code(&self) -> char {
        match self {
            Action::Hit => 'H',
            Action::Stand => 'S',
        }
    }

    pub fn from_code(code: char) -> Option<Action> {
        match code {
            'H' => Some(Action::Hit),
            'S' => Some(Action::Stand),
            _ => None,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Hit => write!(f, "Hit"),
            Action::Stand => write!(f, "Stand"),
        }
    }
}

/// Everything a player may look at when deciding how to play their hand.
pub struct TableState<'a> {
    pub hand: &'a Hand,
    pub chips: Chips,
    pub dealers_up_card: Card,
}

impl<'a> TableState<'a> {
    pub fn new(hand: &'a Hand, chips: Chips, dealers_up_card: Card) -> TableState<'a> {
        TableState {
            hand,
            chips,
            dealers_up_card,
        }
    }
}

/// A trait for the decision making of a seated player, boxed into each `Player` so different
/// strategies can share a table.
pub trait Strategy: Send {
    /// How much to wager this round given the player's current balance.
    fn decide_bet(&self, chips: Chips) -> Chips;
    /// Whether to hit or stand on the hand described by `state`.
    fn decide_action(&self, state: &TableState<'_>) -> Action;
    /// Short description of the strategy for logging.
    fn label(&self) -> String;
}

/// The dealer does not bet, it only ever decides whether to draw another card.
pub trait DealerStrategy: Send {
    fn should_hit(&self, hand: &Hand) -> bool;
    fn label(&self) -> String;
}

/// Clamps a requested bet into `[MIN_BET, chips]`. When `chips` is below the minimum the minimum
/// wins, the table then turns the bet down for insufficient funds.
pub fn clamp_bet(bet: Chips, chips: Chips) -> Chips {
    Chips::max(MIN_BET, Chips::min(bet, chips))
}

/// Bets `percent` of `chips`, rounded down and clamped with `clamp_bet`.
pub fn proportional_bet(chips: Chips, percent: Chips) -> Chips {
    clamp_bet(chips * percent / 100, chips)
}

lazy_static! {
    static ref HARD_TOTALS: HashMap<(u8, u8), Action> = build_hard_totals();
    static ref SOFT_TOTALS: HashMap<(u8, u8), Action> = build_soft_totals();
}

/// Hard totals keyed by (player total, dealer up card value). Aces count 1 as a dealer card.
fn build_hard_totals() -> HashMap<(u8, u8), Action> {
    let mut hard_totals = HashMap::new();
    for i in 2..=21 {
        for j in 1..=10 {
            let option = match i {
                2..=11 => Action::Hit,
                12..=16 => match j {
                    2..=6 => Action::Stand,
                    _ => Action::Hit,
                },
                _ => Action::Stand,
            };
            hard_totals.insert((i, j), option);
        }
    }
    hard_totals
}

/// Soft totals, i.e. hands with an ace counted as 11, keyed like the hard totals.
fn build_soft_totals() -> HashMap<(u8, u8), Action> {
    let mut soft_totals = HashMap::new();
    for i in 12..=21 {
        for j in 1..=10 {
            let option = match i {
                12..=17 => Action::Hit,
                18 => match j {
                    9 | 10 => Action::Hit,
                    _ => Action::Stand,
                },
                _ => Action::Stand,
            };
            soft_totals.insert((i, j), option);
        }
    }
    soft_totals
}

/// Fixed rule player. Bets a share of its balance that grows with the balance and plays from
/// a basic strategy lookup table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicStrategy;

impl BasicStrategy {
    pub fn new() -> BasicStrategy {
        BasicStrategy
    }

    /// Percentage of the balance wagered at a given balance.
    pub fn bet_percent(chips: Chips) -> Chips {
        if chips < 500 {
            10
        } else if chips < 2000 {
            15
        } else {
            20
        }
    }

    /// Looks up the table action for `hand` against the dealer's up card. Totals missing from the
    /// tables can only be bust hands, which stand.
    pub fn lookup(hand: &Hand, dealers_up_card: Card) -> Action {
        let key = (hand.value(), dealers_up_card.val());
        let table = if hand.is_soft() {
            &*SOFT_TOTALS
        } else {
            &*HARD_TOTALS
        };
        table.get(&key).copied().unwrap_or(Action::Stand)
    }
}

impl Strategy for BasicStrategy {
    fn decide_bet(&self, chips: Chips) -> Chips {
        proportional_bet(chips, BasicStrategy::bet_percent(chips))
    }

    fn decide_action(&self, state: &TableState<'_>) -> Action {
        BasicStrategy::lookup(state.hand, state.dealers_up_card)
    }

    fn label(&self) -> String {
        "basic strategy".to_string()
    }
}

/// Playing personalities for players whose decisions are delegated to a decision service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStyle {
    Conservative,
    Aggressive,
}

impl PlayStyle {
    /// Share of the balance bet when the decision service cannot be used.
    pub fn fallback_percent(&self) -> Chips {
        match self {
            PlayStyle::Conservative => 10,
            PlayStyle::Aggressive => 25,
        }
    }
}

impl Display for PlayStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayStyle::Conservative => write!(f, "conservative"),
            PlayStyle::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Player that asks a decision service for bets and actions, falling back to fixed rules
/// whenever the service fails or answers with something unusable.
pub struct DelegatedStrategy {
    style: PlayStyle,
    service: Arc<dyn DecisionService>,
}

impl DelegatedStrategy {
    pub fn new(style: PlayStyle, service: Arc<dyn DecisionService>) -> DelegatedStrategy {
        DelegatedStrategy { style, service }
    }

    pub fn style(&self) -> PlayStyle {
        self.style
    }

    /// Bet decision along with whether the fallback was used.
    pub fn bet_decision(&self, chips: Chips) -> Decision<Chips> {
        let conversation = prompt::bet_conversation(self.style, chips);
        llm::consult(
            self.service.as_ref(),
            &conversation,
            |reply| llm::parse_bet(reply).map(|bet| clamp_bet(bet, chips)),
            || proportional_bet(chips, self.style.fallback_percent()),
        )
    }

    /// Action decision along with whether the fallback was used.
    pub fn action_decision(&self, state: &TableState<'_>) -> Decision<Action> {
        let conversation = prompt::action_conversation(self.style, state.hand, state.dealers_up_card);
        llm::consult(
            self.service.as_ref(),
            &conversation,
            llm::parse_action,
            || BasicStrategy::lookup(state.hand, state.dealers_up_card),
        )
    }
}

impl Strategy for DelegatedStrategy {
    fn decide_bet(&self, chips: Chips) -> Chips {
        let decision = self.bet_decision(chips);
        debug!(style = %self.style, chips, fallback = decision.is_fallback(), "bet decided");
        decision.into_inner()
    }

    fn decide_action(&self, state: &TableState<'_>) -> Action {
        let decision = self.action_decision(state);
        debug!(style = %self.style, hand = %state.hand, fallback = decision.is_fallback(), "action decided");
        decision.into_inner()
    }

    fn label(&self) -> String {
        format!("{} ({})", self.style, self.service.name())
    }
}

/// House rule: draw to 16, stand on 17.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandOnSeventeen;

impl StandOnSeventeen {
    pub fn hits(hand: &Hand) -> bool {
        hand.value() < 17
    }
}

impl DealerStrategy for StandOnSeventeen {
    fn should_hit(&self, hand: &Hand) -> bool {
        StandOnSeventeen::hits(hand)
    }

    fn label(&self) -> String {
        "stand on 17".to_string()
    }
}

/// Dealer that asks a decision service whether to hit, with the house rule as its fallback.
pub struct DelegatedDealer {
    service: Arc<dyn DecisionService>,
}

impl DelegatedDealer {
    pub fn new(service: Arc<dyn DecisionService>) -> DelegatedDealer {
        DelegatedDealer { service }
    }
}

impl DealerStrategy for DelegatedDealer {
    fn should_hit(&self, hand: &Hand) -> bool {
        // A bust hand is already over, there is nothing left to ask.
        if hand.is_bust() {
            debug!(value = hand.value(), "dealer is bust, not consulting service");
            return false;
        }
        let conversation = prompt::dealer_conversation(hand);
        llm::consult(
            self.service.as_ref(),
            &conversation,
            |reply| llm::parse_action(reply).map(|a| a == Action::Hit),
            || StandOnSeventeen::hits(hand),
        )
        .into_inner()
    }

    fn label(&self) -> String {
        format!("delegated dealer ({})", self.service.name())
    }
}
