use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use stockalloc::cli::{AllocateOptions, OutputFormat};
use stockalloc::core::log::init_logging;

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Split a budget across mid-cap and S&P 500 stocks
    Allocate {
        /// Total amount to invest
        #[arg(short, long, allow_negative_numbers = true)]
        budget: f64,

        /// Share of the budget for mid-cap stocks, 0-100
        #[arg(short, long, visible_alias = "risk")]
        mid_cap_percent: f64,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Mid-cap CSV, overriding the configured path
        #[arg(long)]
        mid_cap_csv: Option<PathBuf>,

        /// S&P 500 CSV, overriding the configured path
        #[arg(long)]
        broad_market_csv: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => stockalloc::cli::setup::setup(),
        Some(Commands::Allocate {
            budget,
            mid_cap_percent,
            format,
            mid_cap_csv,
            broad_market_csv,
        }) => {
            let options = AllocateOptions {
                budget,
                mid_cap_percent,
                format,
                mid_cap_csv,
                broad_market_csv,
            };
            stockalloc::run_command(
                stockalloc::AppCommand::Allocate(options),
                cli.config_path.as_deref(),
            )
            .await
            .map(|_| ())
        }
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
