use crate::Chips;

/// Errors raised by the table while dealing or taking bets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlackjackGameError {
    /// A card was drawn from a deck with no cards left. The reshuffle policy should make this
    /// unreachable, so callers treat it as fatal for the game.
    #[error("deck is empty")]
    EmptyDeck,

    /// A bet larger than the bettor's balance. Recoverable, the player sits the round out.
    #[error("insufficient funds: cannot bet {bet} with a balance of {chips}")]
    InsufficientFunds { bet: Chips, chips: Chips },

    /// Turns were requested before the opening cards were dealt.
    #[error("round has not been dealt")]
    RoundNotStarted,
}
