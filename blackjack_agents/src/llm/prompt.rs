//! Prompt templates for the decision service.
//!
//! Each template describes the styled heuristic in plain language and asks for a reply the
//! parsers in the parent module understand: a bare integer for bets, `H` or `S` for actions.

use super::{ChatMessage, Conversation};
use crate::game::strategy::{PlayStyle, MIN_BET};
use blackjack_lib::{Card, Chips, Hand};

const BET_MAX_TOKENS: u32 = 10;
const BET_TEMPERATURE: f32 = 0.3;
const ACTION_MAX_TOKENS: u32 = 1;
const ACTION_TEMPERATURE: f32 = 0.1;

fn bet_hints(style: PlayStyle) -> &'static str {
    match style {
        PlayStyle::Conservative => {
            "Conservative betting hints:\n\
             1. Protect your bankroll first\n\
             2. Never bet more than 10% of your chips\n\
             3. The fewer chips you have, the more careful you should be"
        }
        PlayStyle::Aggressive => {
            "Aggressive betting hints:\n\
             1. Chase high returns\n\
             2. Bet between 20% and 30% of your chips\n\
             3. When your stack is healthy, bet even bigger"
        }
    }
}

fn action_hints(style: PlayStyle) -> &'static str {
    match style {
        PlayStyle::Conservative => {
            "Conservative playing hints:\n\
             1. Avoid busting above all\n\
             2. Always stand on 17 or more\n\
             3. On 12 to 16, stand against a dealer 2 to 6, otherwise hit\n\
             4. Avoid unnecessary risks"
        }
        PlayStyle::Aggressive => {
            "Aggressive playing hints:\n\
             1. Go for bigger totals\n\
             2. Hit often on 16 or less\n\
             3. Accept the risk of busting to reach a higher total\n\
             4. Be bold"
        }
    }
}

fn action_attitude(style: PlayStyle) -> &'static str {
    match style {
        PlayStyle::Conservative => "Put safety first and avoid the risk of busting.",
        PlayStyle::Aggressive => "Be willing to take risks to reach a higher total.",
    }
}

/// Asks how much to wager with `chips` available.
pub fn bet_conversation(style: PlayStyle, chips: Chips) -> Conversation {
    let system = format!(
        "You are a {} blackjack player, skilled at bankroll management and risk control.",
        style
    );
    let question = format!(
        "You are a {style} blackjack player and must decide how many chips to bet this round.\n\n\
         Current state:\n\
         - Your chips: {chips}\n\
         - Minimum bet: {min}\n\
         - Maximum bet: {chips}\n\n\
         {hints}\n\n\
         Reply with a single number: the amount of chips you bet.",
        style = style,
        chips = chips,
        min = MIN_BET,
        hints = bet_hints(style),
    );

    Conversation {
        messages: vec![ChatMessage::system(system), ChatMessage::user(question)],
        max_tokens: BET_MAX_TOKENS,
        temperature: BET_TEMPERATURE,
    }
}

/// Asks whether to hit or stand on `hand` against the dealer's up card.
pub fn action_conversation(style: PlayStyle, hand: &Hand, dealers_up_card: Card) -> Conversation {
    let system = format!(
        "You are a {} blackjack player.\n\
         Your task is to decide based on the current state and your style.\n\
         {}\n\
         Your reply must be brief: only 'H' or 'S'.",
        style,
        action_attitude(style)
    );
    let question = format!(
        "You are a {style} blackjack player and must make the best decision for the current state.\n\n\
         Rules:\n\
         1. An ace counts as 1 or 11\n\
         2. J, Q and K count as 10\n\
         3. Going over 21 is a bust and loses immediately\n\
         4. The dealer must stand on 17 or more\n\n\
         {hints}\n\n\
         Current state:\n\
         - Your hand: {hand}\n\
         - Hand total: {value}\n\
         - Dealer up card: {up}\n\n\
         Analyse the state according to your style and reply strictly as follows:\n\
         1. To hit, reply only with the letter 'H'\n\
         2. To stand, reply only with the letter 'S'",
        style = style,
        hints = action_hints(style),
        hand = hand,
        value = hand.value(),
        up = dealers_up_card,
    );

    Conversation {
        messages: vec![
            ChatMessage::system(system),
            ChatMessage::assistant(
                "Understood. I will decide from basic strategy and the odds, and reply only 'H' or 'S'.",
            ),
            ChatMessage::user("Hand: KING of ♠, FIVE of ♣\nDealer up card: SIX of ♥"),
            ChatMessage::assistant("S"),
            ChatMessage::user("Hand: ACE of ♥, FIVE of ♣\nDealer up card: TEN of ♦"),
            ChatMessage::assistant("H"),
            ChatMessage::user(question),
        ],
        max_tokens: ACTION_MAX_TOKENS,
        temperature: ACTION_TEMPERATURE,
    }
}

/// Asks the dealer whether to draw another card.
pub fn dealer_conversation(hand: &Hand) -> Conversation {
    let question = format!(
        "You are the dealer in a game of blackjack and must decide whether to draw a card.\n\n\
         Dealer rules:\n\
         1. Stand on 17 or more\n\
         2. Hit on 16 or less\n\
         3. An ace counts as 1 or 11\n\
         4. Going over 21 is a bust and loses immediately\n\n\
         Current state:\n\
         - Your hand: {hand}\n\
         - Hand total: {value}\n\n\
         Reply strictly as follows:\n\
         1. To hit, reply only with the letter 'H'\n\
         2. To stand, reply only with the letter 'S'",
        hand = hand,
        value = hand.value(),
    );

    Conversation {
        messages: vec![
            ChatMessage::system(
                "You are a blackjack dealer.\n\
                 You must follow the dealer rules strictly: stand on 17 or more, hit on 16 or less.\n\
                 Your reply must be brief: only 'H' or 'S'.",
            ),
            ChatMessage::assistant("Understood. I will follow the dealer rules and reply only 'H' or 'S'."),
            ChatMessage::user("Hand: KING of ♠, SEVEN of ♣"),
            ChatMessage::assistant("S"),
            ChatMessage::user("Hand: NINE of ♥, FIVE of ♣"),
            ChatMessage::assistant("H"),
            ChatMessage::user(question),
        ],
        max_tokens: ACTION_MAX_TOKENS,
        temperature: ACTION_TEMPERATURE,
    }
}
