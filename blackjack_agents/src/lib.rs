pub mod config;
pub mod game;
pub mod llm;
pub mod stats;
pub mod write;

use config::{default_roster, AppConfig, PlayerKind, PlayerSpec};
pub use game::prelude::*;
use game::strategy::{
    BasicStrategy, DealerStrategy, DelegatedDealer, DelegatedStrategy, PlayStyle,
    StandOnSeventeen, Strategy,
};
use llm::DecisionService;
use stats::GameStats;
use std::any::Any;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

pub mod prelude {
    pub use super::{
        game::prelude::*, stats::GameStats, BlackjackSimulator, BlackjackSimulatorConfig,
        BlackjackSimulatorConfigBuilder, SimulationError, ThreadSummary,
    };
}

/// Errors raised while running a simulation or writing its results.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("game error: {0}")]
    Game(#[from] BlackjackGameError),

    #[error("table thread {thread} failed: {message}")]
    ThreadFailure { thread: usize, message: String },

    #[error("round index {round} is out of range for a {total} round simulation")]
    RoundOutOfRange { round: usize, total: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to write results: {0}")]
    Write(#[from] std::io::Error),
}

/// Final balances of one table thread after its last round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadSummary {
    pub thread_id: usize,
    /// Player names and final balances, in seating order.
    pub players: Vec<(String, Chips)>,
    pub dealer_chips: Chips,
}

impl ThreadSummary {
    fn from_game(thread_id: usize, game: &BlackjackGame) -> ThreadSummary {
        ThreadSummary {
            thread_id,
            players: game
                .players()
                .iter()
                .map(|p| (p.name.clone(), p.chips))
                .collect(),
            dealer_chips: game.dealer().chips,
        }
    }
}

/// Splits global round indices `0..total_rounds` into one contiguous block per thread. The first
/// `total_rounds % threads` blocks get one extra round, so blocks may be empty when there are
/// more threads than rounds.
pub fn partition_rounds(total_rounds: usize, threads: usize) -> Vec<Range<usize>> {
    if threads == 0 {
        return vec![];
    }
    let base = total_rounds / threads;
    let extra = total_rounds % threads;
    let mut start = 0;
    (0..threads)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let block = start..start + len;
            start += len;
            block
        })
        .collect()
}

/// Struct for configuring a `BlackjackSimulator`.
#[derive(Debug, Clone, PartialEq)]
pub struct BlackjackSimulatorConfig {
    pub threads: usize,
    pub total_rounds: usize,
    pub player_starting_chips: Chips,
    pub dealer_starting_chips: Chips,
    pub round_delay: Duration,
    pub delegated_dealer: bool,
    pub players: Vec<PlayerSpec>,
}

impl BlackjackSimulatorConfig {
    /// Associated method for returning a new `BlackjackSimulatorConfigBuilder` object. Allows the
    /// user to choose the parameters of the simulation, i.e. how many threads play, how many rounds
    /// are played in total, the starting balances and who sits at the table.
    pub fn new() -> BlackjackSimulatorConfigBuilder {
        BlackjackSimulatorConfigBuilder {
            threads: None,
            total_rounds: None,
            player_starting_chips: None,
            dealer_starting_chips: None,
            round_delay: None,
            delegated_dealer: None,
            players: None,
        }
    }

    /// Checks the parameters a simulation cannot run without.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.threads == 0 {
            return Err(SimulationError::Config(
                "at least one thread is required".to_string(),
            ));
        }
        if self.players.is_empty() {
            return Err(SimulationError::Config(
                "at least one player is required".to_string(),
            ));
        }
        // Names key the chip history, so they must be unique and distinct from the dealer's.
        let mut names = HashSet::new();
        for spec in &self.players {
            if spec.name == DEALER_NAME || !names.insert(spec.name.as_str()) {
                return Err(SimulationError::Config(format!(
                    "player name '{}' is not unique",
                    spec.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for BlackjackSimulatorConfig {
    /// Returns the standard configuration: three players, a delegated dealer, 40 rounds over 4 threads.
    fn default() -> Self {
        BlackjackSimulatorConfig::new().build()
    }
}

impl From<&AppConfig> for BlackjackSimulatorConfig {
    fn from(config: &AppConfig) -> Self {
        let sim = &config.simulation;
        BlackjackSimulatorConfig::new()
            .threads(sim.threads)
            .total_rounds(sim.total_rounds)
            .player_starting_chips(sim.player_starting_chips)
            .dealer_starting_chips(sim.dealer_starting_chips)
            .round_delay(Duration::from_millis(sim.round_delay_ms))
            .delegated_dealer(sim.delegated_dealer)
            .players(config.players.clone())
            .build()
    }
}

/// Struct to implement builder pattern for `BlackjackSimulatorConfig`
#[derive(Debug, Clone)]
pub struct BlackjackSimulatorConfigBuilder {
    threads: Option<usize>,
    total_rounds: Option<usize>,
    player_starting_chips: Option<Chips>,
    dealer_starting_chips: Option<Chips>,
    round_delay: Option<Duration>,
    delegated_dealer: Option<bool>,
    players: Option<Vec<PlayerSpec>>,
}

impl BlackjackSimulatorConfigBuilder {
    /// Method for setting the number of tables played in parallel.
    pub fn threads(&mut self, threads: usize) -> &mut Self {
        self.threads = Some(threads);
        self
    }

    /// Method for setting the number of rounds played across all threads.
    pub fn total_rounds(&mut self, rounds: usize) -> &mut Self {
        self.total_rounds = Some(rounds);
        self
    }

    pub fn player_starting_chips(&mut self, chips: Chips) -> &mut Self {
        self.player_starting_chips = Some(chips);
        self
    }

    pub fn dealer_starting_chips(&mut self, chips: Chips) -> &mut Self {
        self.dealer_starting_chips = Some(chips);
        self
    }

    /// Method for setting the pause between two rounds on the same table.
    pub fn round_delay(&mut self, delay: Duration) -> &mut Self {
        self.round_delay = Some(delay);
        self
    }

    /// Method for setting the flag that decides whether the dealer consults the decision service
    /// or simply stands on 17.
    pub fn delegated_dealer(&mut self, delegated: bool) -> &mut Self {
        self.delegated_dealer = Some(delegated);
        self
    }

    /// Method for replacing the players seated at every table.
    pub fn players(&mut self, players: Vec<PlayerSpec>) -> &mut Self {
        self.players = Some(players);
        self
    }

    /// Method that adds a single player to the roster.
    pub fn player(&mut self, name: &str, kind: PlayerKind) -> &mut Self {
        self.players
            .get_or_insert_with(Vec::new)
            .push(PlayerSpec::new(name, kind));
        self
    }

    /// Method for building a `BlackjackSimulatorConfig` object from the given builder.
    pub fn build(&mut self) -> BlackjackSimulatorConfig {
        BlackjackSimulatorConfig {
            threads: self.threads.unwrap_or(4),
            total_rounds: self.total_rounds.unwrap_or(40),
            player_starting_chips: self.player_starting_chips.unwrap_or(1000),
            dealer_starting_chips: self.dealer_starting_chips.unwrap_or(5000),
            round_delay: self.round_delay.unwrap_or(Duration::from_millis(50)),
            delegated_dealer: self.delegated_dealer.unwrap_or(true),
            players: self.players.clone().unwrap_or_else(default_roster),
        }
    }
}

/// Runs independent blackjack tables on their own threads. Every table seats the configured
/// players and a dealer, plays a contiguous block of the global rounds, and records balances into
/// a shared `GameStats`.
pub struct BlackjackSimulator {
    config: BlackjackSimulatorConfig,
    service: Arc<dyn DecisionService>,
}

impl BlackjackSimulator {
    pub fn new(config: BlackjackSimulatorConfig, service: Arc<dyn DecisionService>) -> Self {
        BlackjackSimulator { config, service }
    }

    pub fn config(&self) -> &BlackjackSimulatorConfig {
        &self.config
    }

    pub fn round_blocks(&self) -> Vec<Range<usize>> {
        partition_rounds(self.config.total_rounds, self.config.threads)
    }

    /// Builds a fresh game with the configured roster. Delegated players and dealer share the
    /// simulator's decision service.
    pub fn build_game(&self) -> BlackjackGame {
        let dealer_strategy: Box<dyn DealerStrategy> = if self.config.delegated_dealer {
            Box::new(DelegatedDealer::new(Arc::clone(&self.service)))
        } else {
            Box::new(StandOnSeventeen)
        };
        let mut game = BlackjackGame::new(Dealer::new(
            self.config.dealer_starting_chips,
            dealer_strategy,
        ));
        for spec in &self.config.players {
            let strategy: Box<dyn Strategy> = match spec.kind {
                PlayerKind::Basic => Box::new(BasicStrategy::new()),
                PlayerKind::Conservative => Box::new(DelegatedStrategy::new(
                    PlayStyle::Conservative,
                    Arc::clone(&self.service),
                )),
                PlayerKind::Aggressive => Box::new(DelegatedStrategy::new(
                    PlayStyle::Aggressive,
                    Arc::clone(&self.service),
                )),
            };
            game.add_player(Player::new(
                spec.name.clone(),
                self.config.player_starting_chips,
                strategy,
            ));
        }
        game
    }

    /// Plays every round and joins all table threads. A thread that fails or panics is logged
    /// and left out of the returned summaries, the other threads are unaffected.
    pub fn run(&self, stats: Arc<GameStats>) -> Result<Vec<ThreadSummary>, SimulationError> {
        self.config.validate()?;
        if stats.total_rounds() != self.config.total_rounds {
            return Err(SimulationError::Config(format!(
                "statistics sized for {} rounds, simulation plays {}",
                stats.total_rounds(),
                self.config.total_rounds
            )));
        }

        info!(
            threads = self.config.threads,
            total_rounds = self.config.total_rounds,
            players = self.config.players.len(),
            service = self.service.name(),
            "starting simulation"
        );

        let mut handles: Vec<(usize, JoinHandle<Result<ThreadSummary, SimulationError>>)> =
            vec![];
        for (thread_id, rounds) in self.round_blocks().into_iter().enumerate() {
            if rounds.is_empty() {
                debug!(thread_id, "no rounds left for thread");
                continue;
            }
            let game = self.build_game();
            let stats = Arc::clone(&stats);
            let delay = self.config.round_delay;
            let spawned = thread::Builder::new()
                .name(format!("table-{thread_id}"))
                .spawn(move || play_rounds(thread_id, game, rounds, &stats, delay));
            match spawned {
                Ok(handle) => handles.push((thread_id, handle)),
                Err(e) => {
                    let failure = SimulationError::ThreadFailure {
                        thread: thread_id,
                        message: e.to_string(),
                    };
                    error!(error = %failure, "could not start table thread");
                }
            }
        }

        let mut summaries = vec![];
        for (thread_id, handle) in handles {
            let failure = match handle.join() {
                Ok(Ok(summary)) => {
                    summaries.push(summary);
                    continue;
                }
                Ok(Err(e)) => SimulationError::ThreadFailure {
                    thread: thread_id,
                    message: e.to_string(),
                },
                Err(payload) => SimulationError::ThreadFailure {
                    thread: thread_id,
                    message: panic_message(payload.as_ref()),
                },
            };
            error!(error = %failure, "table thread failed, its results are omitted");
        }

        info!(completed = summaries.len(), "simulation finished");
        Ok(summaries)
    }
}

/// Body of a table thread: plays `rounds` in order, recording every balance after settlement.
fn play_rounds(
    thread_id: usize,
    mut game: BlackjackGame,
    rounds: Range<usize>,
    stats: &GameStats,
    delay: Duration,
) -> Result<ThreadSummary, SimulationError> {
    info!(thread_id, first_round = rounds.start, rounds = rounds.len(), "table open");
    record_balances(&game, stats, rounds.start)?;

    for round in rounds {
        game.start_round()?;
        let report = game.play_round()?;
        info!(
            thread_id,
            round,
            dealer_value = report.dealer_value,
            dealer_chips = report.dealer_chips,
            "round complete"
        );
        record_balances(&game, stats, round)?;
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    Ok(ThreadSummary::from_game(thread_id, &game))
}

fn record_balances(
    game: &BlackjackGame,
    stats: &GameStats,
    round: usize,
) -> Result<(), SimulationError> {
    for player in game.players() {
        stats.record(&player.name, player.chips, round)?;
    }
    stats.record(game.dealer().name(), game.dealer().chips, round)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "thread panicked".to_string()
    }
}
