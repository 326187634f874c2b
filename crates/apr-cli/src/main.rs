mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::amortize::AmortizeArgs;
use commands::calculate::CalculateArgs;
use commands::common_period::CommonPeriodArgs;

/// Regulation Z annual percentage rate calculations
#[derive(Parser)]
#[command(
    name = "apr",
    version,
    about = "Regulation Z annual percentage rate calculations",
    long_about = "A CLI for computing the actuarial annual percentage rate of loan schedules \
                  with irregular payment dates. Infers the common period, discounts odd days \
                  with simple interest, and searches for the zero-balance rate."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log solver progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the APR of a line item schedule
    Calculate(CalculateArgs),
    /// Infer the common period of a set of dates
    CommonPeriod(CommonPeriodArgs),
    /// Amortize a line item schedule at a fixed rate
    Amortize(AmortizeArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apr_core=debug,apr=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apr_core=warn,apr=warn"))
    };

    // stdout carries the result; logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::calculate::run_calculate(args),
        Commands::CommonPeriod(args) => commands::common_period::run_common_period(args),
        Commands::Amortize(args) => commands::amortize::run_amortize(args),
        Commands::Version => {
            println!("apr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
