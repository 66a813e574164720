//! Configuration loading from TOML with environment variable resolution.
//!
//! Every section has defaults matching the classic three player table, so the file is
//! optional. The decision service API key is referenced by env var name and resolved at
//! runtime, it never lives in the file.

use anyhow::{Context, Result};
use blackjack_lib::Chips;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationSettings,
    pub llm: LlmConfig,
    pub players: Vec<PlayerSpec>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationSettings {
    pub threads: usize,
    pub total_rounds: usize,
    pub player_starting_chips: Chips,
    pub dealer_starting_chips: Chips,
    /// Pause between rounds, throttles calls to the decision service.
    pub round_delay_ms: u64,
    /// Whether the dealer consults the decision service instead of the house rule.
    pub delegated_dealer: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI compatible API, `/chat/completions` is appended.
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

/// Which decision policy a seat uses.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    Basic,
    Conservative,
    Aggressive,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct PlayerSpec {
    pub name: String,
    pub kind: PlayerKind,
}

impl PlayerSpec {
    pub fn new(name: &str, kind: PlayerKind) -> PlayerSpec {
        PlayerSpec {
            name: name.to_string(),
            kind,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            simulation: SimulationSettings::default(),
            llm: LlmConfig::default(),
            players: default_roster(),
        }
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            threads: 4,
            total_rounds: 40,
            player_starting_chips: 1000,
            dealer_starting_chips: 5000,
            round_delay_ms: 50,
            delegated_dealer: true,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LlmConfig {
    /// The API key, if the configured env var is set and non empty.
    pub fn api_key(&self) -> Option<String> {
        AppConfig::resolve_env(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

/// One fixed rule player and two delegated players of opposite temperament.
pub fn default_roster() -> Vec<PlayerSpec> {
    vec![
        PlayerSpec::new("Basic Strategy Player", PlayerKind::Basic),
        PlayerSpec::new("Conservative AI Player", PlayerKind::Conservative),
        PlayerSpec::new("Aggressive AI Player", PlayerKind::Aggressive),
    ]
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
