use allot::core::log::init_logging;
use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for allot::AppCommand {
    fn from(cmd: Commands) -> allot::AppCommand {
        match cmd {
            Commands::Plan => allot::AppCommand::Plan,
            Commands::Targets => allot::AppCommand::Targets,
            Commands::Set { symbol, weight } => allot::AppCommand::SetWeight { symbol, weight },
            Commands::Add { symbol } => allot::AppCommand::AddHolding { symbol },
            Commands::Remove { symbol } => allot::AppCommand::RemoveHolding { symbol },
            Commands::Priority { symbol } => allot::AppCommand::SetPriority { symbol },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compute the purchase plan for the configured budget
    Plan,
    /// Display the target weight table
    Targets,
    /// Set one holding's target weight and rebalance the rest
    Set {
        symbol: String,
        /// New weight in percentage points (0-100)
        weight: f64,
    },
    /// Add a holding at weight 0
    Add { symbol: String },
    /// Remove a holding and renormalize the remaining weights
    Remove { symbol: String },
    /// Mark a holding as the priority
    Priority { symbol: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => allot::cli::setup::setup(),
        Some(cmd) => allot::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
