//! The perlan CLI: play the museum quiz and manage its content from a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "perlan", version, about = "Offline-first Perlan museum trivia quiz")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter perlan.toml and a sample content pack
    Init,

    /// Mirror questions and learning modules from the remote store
    Sync,

    /// Play a round
    Play {
        /// Player name
        #[arg(long)]
        user: String,

        /// Category slug (e.g. "northern-lights"); "general" mixes everything
        #[arg(long, default_value = "general")]
        category: String,

        /// Difficulty: easy, medium, hard
        #[arg(long, default_value = "medium")]
        difficulty: String,

        /// Challenge mode: each question times out
        #[arg(long)]
        challenge: bool,
    },

    /// Show the leaderboard, or one player's stats
    Stats {
        /// Show a single player
        #[arg(long)]
        user: Option<String>,
    },

    /// Manage the question bank
    Questions {
        #[command(subcommand)]
        action: commands::questions::QuestionsAction,
    },

    /// Manage learning modules
    Modules {
        #[command(subcommand)]
        action: commands::modules::ModulesAction,
    },

    /// Add questions and modules from content pack TOML files
    Import {
        /// Path to a .toml content pack or directory
        path: PathBuf,
    },

    /// Validate content pack TOML files
    Validate {
        /// Path to a .toml content pack or directory
        path: PathBuf,
    },

    /// Draft new questions with the configured generator
    Generate {
        /// Category slug
        #[arg(long)]
        category: String,

        /// Difficulty: easy, medium, hard
        #[arg(long, default_value = "medium")]
        difficulty: String,

        /// Number of questions to ask for
        #[arg(long, default_value = "5")]
        count: usize,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Add the drafted questions to the question bank
        #[arg(long)]
        save: bool,
    },

    /// Browse learning modules and mark units complete
    Learn {
        /// Player name
        #[arg(long)]
        user: String,

        /// Module id; lists every module when omitted
        #[arg(long)]
        module: Option<String>,

        /// Unit id to mark complete
        #[arg(long, requires = "module")]
        complete: Option<String>,
    },

    /// Delete all locally cached content, results and stats
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("perlan_core=info,perlan_remote=info,perlan=info")
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Sync => commands::sync::execute(config).await,
        Commands::Play {
            user,
            category,
            difficulty,
            challenge,
        } => commands::play::execute(config, user, category, difficulty, challenge).await,
        Commands::Stats { user } => commands::stats::execute(config, user),
        Commands::Questions { action } => commands::questions::execute(config, action).await,
        Commands::Modules { action } => commands::modules::execute(config, action).await,
        Commands::Import { path } => commands::import::execute(config, path).await,
        Commands::Validate { path } => commands::validate::execute(path),
        Commands::Generate {
            category,
            difficulty,
            count,
            model,
            save,
        } => commands::generate::execute(config, category, difficulty, count, model, save).await,
        Commands::Learn {
            user,
            module,
            complete,
        } => commands::learn::execute(config, user, module, complete).await,
        Commands::Reset { yes } => commands::reset::execute(config, yes),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
