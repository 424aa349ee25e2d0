//! Dish & Dose — command-line front end.
//!
//! Checks a medication/food pair against the oracle, records the answer in
//! the local history, and lets the user browse, favorite, and clear that
//! history between runs.
//!
//! Usage:
//!   dishdose check -m Warfarin -f "Leafy greens"
//!   dishdose example 2
//!   dishdose history --query grapefruit
//!   dishdose favorite <ID>
//!   dishdose --offline check -m Metronidazole -f Alcohol

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dishdose_contracts::{
    assessment::AssessmentResult,
    error::{DishDoseError, DishDoseResult},
    history::{EntryId, HistoryEntry},
    storage::Theme,
};
use dishdose_core::{
    notice::{Notice, NoticeLevel},
    orchestrator::{Orchestrator, SubmitOutcome},
    preferences::Preferences,
    traits::{DurableStore, Oracle, SystemClock},
    HistoryLedger,
};
use dishdose_oracle::{GeminiOracle, MockOracle, OracleConfig, EXAMPLE_QUERIES};
use dishdose_store::{FileStore, InMemoryStore};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Dish & Dose — food-drug interaction checker.
#[derive(Parser)]
#[command(
    name = "dishdose",
    about = "Check medications against food and drink for interactions",
    long_about = "Asks an AI oracle whether a medication/food pair interacts,\n\
                  and keeps a local, searchable history of past checks."
)]
struct Cli {
    /// Directory holding history and preferences. Defaults to the platform data dir.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML file with oracle settings.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the built-in offline table instead of the remote oracle.
    #[arg(long, global = true)]
    offline: bool,

    /// Keep history and preferences in memory only for this run.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check one medication/food pair.
    Check {
        /// Medication name(s), e.g. "Warfarin" or "Lisinopril, Metformin".
        #[arg(short, long, default_value = "")]
        medications: String,
        /// Food or beverage, e.g. "Grapefruit juice".
        #[arg(short, long, default_value = "")]
        food: String,
    },
    /// Run one of the built-in example queries (1-based).
    Example { number: usize },
    /// List the built-in example queries.
    Examples,
    /// List past checks, favorites first.
    History {
        /// Case-insensitive filter on medication or food.
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Show a past check without asking the oracle again.
    Show { id: String },
    /// Toggle the favorite flag on a past check.
    Favorite { id: String },
    /// Delete all history.
    Clear,
    /// Show or change the display theme.
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
    /// Show the welcome message again.
    Welcome,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("dishdose: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Session wiring ────────────────────────────────────────────────────────────

struct Session {
    orchestrator: Orchestrator,
    preferences: Preferences,
}

impl Session {
    fn open(cli: &Cli) -> DishDoseResult<Self> {
        let store: Arc<dyn DurableStore> = if cli.ephemeral {
            Arc::new(InMemoryStore::new())
        } else {
            let dir = match &cli.data_dir {
                Some(dir) => dir.clone(),
                None => dirs::data_dir()
                    .map(|d| d.join("dish-dose"))
                    .ok_or_else(|| DishDoseError::Config {
                        reason: "could not determine a data directory; pass --data-dir"
                            .to_string(),
                    })?,
            };
            info!(dir = %dir.display(), "opening file store");
            Arc::new(FileStore::open(dir)?)
        };

        let oracle: Box<dyn Oracle> = if cli.offline {
            Box::new(MockOracle::new())
        } else {
            let config = match &cli.config {
                Some(path) => OracleConfig::from_file(path)?,
                None => OracleConfig::default(),
            };
            Box::new(GeminiOracle::new(config)?)
        };

        let ledger = HistoryLedger::load(store.clone(), Arc::new(SystemClock));
        Ok(Self {
            orchestrator: Orchestrator::new(oracle, ledger),
            preferences: Preferences::load(store),
        })
    }
}

async fn run(cli: Cli) -> DishDoseResult<bool> {
    let mut session = Session::open(&cli)?;

    if session.preferences.should_welcome() && !matches!(cli.command, Command::Welcome) {
        print_welcome();
        session.preferences.mark_welcomed();
    }

    match cli.command {
        Command::Check { medications, food } => {
            let outcome = session.orchestrator.run(&medications, &food).await?;
            Ok(print_outcome(&outcome))
        }
        Command::Example { number } => {
            let example = number
                .checked_sub(1)
                .and_then(|i| EXAMPLE_QUERIES.get(i))
                .ok_or_else(|| DishDoseError::Config {
                    reason: format!(
                        "no example {}; choose 1 to {}",
                        number,
                        EXAMPLE_QUERIES.len()
                    ),
                })?;
            println!("{} + {}", example.medications, example.food);
            let outcome = session
                .orchestrator
                .run(example.medications, example.food)
                .await?;
            Ok(print_outcome(&outcome))
        }
        Command::Examples => {
            for (i, example) in EXAMPLE_QUERIES.iter().enumerate() {
                println!("  {}. {} + {}", i + 1, example.medications, example.food);
            }
            Ok(true)
        }
        Command::History { query } => {
            let entries = session.orchestrator.history(&query)?;
            if entries.is_empty() {
                if query.trim().is_empty() {
                    println!("No history yet.");
                } else {
                    println!("No history matches '{}'.", query.trim());
                }
            }
            for entry in &entries {
                print_history_line(entry);
            }
            Ok(true)
        }
        Command::Show { id } => {
            let entry = session.orchestrator.load_from_history(&EntryId::from(id.as_str()))?;
            println!("{} + {}", entry.medications, entry.food);
            println!("Checked {}", format_timestamp(entry.timestamp));
            println!();
            print_result(&entry.result);
            Ok(true)
        }
        Command::Favorite { id } => {
            let toggle = session.orchestrator.toggle_favorite(&EntryId::from(id.as_str()))?;
            print_notice(toggle.notice());
            Ok(toggle.is_saved())
        }
        Command::Clear => {
            let cleared = session.orchestrator.clear_history()?;
            print_notice(cleared.clear_notice());
            Ok(cleared.is_saved())
        }
        Command::Theme { mode } => {
            let changed = match mode {
                None => {
                    println!("Theme: {}", session.preferences.theme());
                    return Ok(true);
                }
                Some(ThemeArg::Light) => session.preferences.set_theme(Theme::Light),
                Some(ThemeArg::Dark) => session.preferences.set_theme(Theme::Dark),
                Some(ThemeArg::Toggle) => session.preferences.toggle_theme(),
            };
            println!("Theme: {}", changed.value);
            if let Some(warning) = &changed.warning {
                eprintln!("  (not saved: {})", warning);
            }
            Ok(true)
        }
        Command::Welcome => {
            print_welcome();
            session.preferences.mark_welcomed();
            Ok(true)
        }
    }
}

// ── Rendering ─────────────────────────────────────────────────────────────────

fn print_outcome(outcome: &SubmitOutcome) -> bool {
    match outcome {
        SubmitOutcome::Rejected(failure) | SubmitOutcome::Failed(failure) => {
            eprintln!("{}", failure.user_message());
            false
        }
        SubmitOutcome::Succeeded {
            result,
            entry,
            notices,
        } => {
            print_result(result);
            println!();
            println!("Saved as {}", entry.id);
            for notice in notices {
                print_notice(*notice);
            }
            true
        }
        // A one-shot run never overlaps submissions.
        SubmitOutcome::Superseded => true,
    }
}

fn print_result(result: &AssessmentResult) {
    println!(
        "{} {}  (severity: {})",
        result.status.symbol(),
        result.status,
        result.severity
    );
    println!();
    println!("Interaction details:");
    println!("  {}", result.details);
    println!();
    println!("Recommendations:");
    println!("  {}", result.recommendations);
    println!();
    println!("Additional notes:");
    println!("  {}", result.notes().unwrap_or("None"));
    println!();
    println!("This is general information, not medical advice. Ask your pharmacist or doctor.");
}

fn print_history_line(entry: &HistoryEntry) {
    let star = if entry.favorite { "*" } else { " " };
    println!(
        "{} {}  {:<5} {:<9}  {} + {}  ({})",
        star,
        entry.id,
        entry.result.status.symbol(),
        entry.result.status,
        entry.medications,
        entry.food,
        format_timestamp(entry.timestamp),
    );
}

fn print_notice(notice: Notice) {
    let prefix = match notice.level() {
        NoticeLevel::Success => "[ok]",
        NoticeLevel::Info => "[i]",
        NoticeLevel::Error => "[x]",
    };
    match notice.level() {
        NoticeLevel::Error => eprintln!("{} {}", prefix, notice),
        _ => println!("{} {}", prefix, notice),
    }
}

fn format_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_welcome() {
    println!();
    println!("Welcome to Dish & Dose");
    println!("======================");
    println!();
    println!("Enter your medication(s) and a food or drink to learn whether they interact.");
    println!("Try one of these to start (dishdose example N):");
    for (i, example) in EXAMPLE_QUERIES.iter().enumerate() {
        println!("  {}. {} + {}", i + 1, example.medications, example.food);
    }
    println!();
}
