//! Runs the multi-table blackjack simulation, then writes the chip history and prints each
//! table's final balances.

use anyhow::{Context, Result};
use blackjack_agents::config::AppConfig;
use blackjack_agents::llm::{self, DecisionService, OfflineService};
use blackjack_agents::stats::GameStats;
use blackjack_agents::write;
use blackjack_agents::{BlackjackSimulator, BlackjackSimulatorConfig};
use clap::Parser;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "blackjack_agents",
    about = "Simulate blackjack tables with rule based and delegated players"
)]
struct Args {
    /// Path to the TOML configuration, defaults are used when it does not exist
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of tables played in parallel
    #[arg(long)]
    threads: Option<usize>,

    /// Total number of rounds, split across the tables
    #[arg(long)]
    rounds: Option<usize>,

    /// Directory the chip history files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Never contact the decision service, delegated agents use their fallback rules
    #[arg(long, default_value_t = false)]
    offline: bool,
}

fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();
    init_logging();

    let args = Args::parse();
    let mut cfg = AppConfig::load_or_default(&args.config)?;
    if let Some(threads) = args.threads {
        cfg.simulation.threads = threads;
    }
    if let Some(rounds) = args.rounds {
        cfg.simulation.total_rounds = rounds;
    }

    let service: Arc<dyn DecisionService> = if args.offline {
        Arc::new(OfflineService)
    } else {
        llm::connect(&cfg.llm)?
    };

    let config = BlackjackSimulatorConfig::from(&cfg);
    let stats = Arc::new(GameStats::new(config.total_rounds));
    let simulator = BlackjackSimulator::new(config, service);
    let summaries = simulator.run(Arc::clone(&stats))?;

    let history = stats.history();
    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            args.output_dir.display()
        )
    })?;

    let csv_path = args.output_dir.join("chips_history.csv");
    let csv_file = File::create(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    write::write_history_csv(&history, BufWriter::new(csv_file))
        .with_context(|| format!("Failed to write {}", csv_path.display()))?;

    let json_path = args.output_dir.join("chips_history.json");
    let json_file = File::create(&json_path)
        .with_context(|| format!("Failed to create {}", json_path.display()))?;
    write::write_history_json(&history, BufWriter::new(json_file))
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    info!(csv = %csv_path.display(), json = %json_path.display(), "chip history written");

    let config = simulator.config();
    write::write_final_summary(
        &summaries,
        config.player_starting_chips,
        config.dealer_starting_chips,
        std::io::stdout().lock(),
    )?;
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("blackjack_agents=info"));

    if std::env::var("BLACKJACK_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_names(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_names(true)
            .init();
    }
}
