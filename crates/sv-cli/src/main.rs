//! CLI frontend for the Salvo combat engine.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "salvo",
    about = "Salvo: seeded attack resolution for tabletop wargames",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an action against a board and print the outcome
    Resolve {
        /// Board JSON file
        #[arg(short, long)]
        board: PathBuf,

        /// Weapon catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Action JSON file
        #[arg(short, long)]
        action: PathBuf,

        /// RNG seed for deterministic resolution
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Keep only the newest N roll records (0 = all)
        #[arg(long, default_value = "0")]
        max_log: usize,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Show every roll record
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show expected hits, wounds and damage without rolling
    Estimate {
        /// Board JSON file
        #[arg(short, long)]
        board: PathBuf,

        /// Weapon catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Action JSON file
        #[arg(short, long)]
        action: PathBuf,

        /// Print the estimates as JSON
        #[arg(long)]
        json: bool,
    },

    /// List weapon profiles and their classified keywords
    Weapons {
        /// Weapon catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Also list weapons carried by units on this board
        #[arg(short, long)]
        board: Option<PathBuf>,
    },

    /// Load and validate a board, catalog and optional action
    Check {
        /// Board JSON file
        #[arg(short, long)]
        board: PathBuf,

        /// Weapon catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Action JSON file to validate against the board
        #[arg(short, long)]
        action: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Resolve {
            board,
            catalog,
            action,
            seed,
            max_log,
            json,
            verbose,
        } => commands::resolve::run(&commands::resolve::Options {
            board: &board,
            catalog: catalog.as_deref(),
            action: &action,
            seed,
            max_log,
            json,
            verbose,
        }),
        Commands::Estimate {
            board,
            catalog,
            action,
            json,
        } => commands::estimate::run(&board, catalog.as_deref(), &action, json),
        Commands::Weapons { catalog, board } => {
            commands::weapons::run(catalog.as_deref(), board.as_deref())
        }
        Commands::Check {
            board,
            catalog,
            action,
        } => commands::check::run(&board, catalog.as_deref(), action.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
