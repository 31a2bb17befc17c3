mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::bank::{BankStatsArgs, PredictArgs, TopOffersArgs};
use commands::vc::{AdminSavingsArgs, AllocateArgs, CurveArgs, SavingsArgs};
use output::OutputFormat;
use vendor_savings_core::SavingsError;

/// Vendor-discount savings projections
#[derive(Parser)]
#[command(
    name = "vsave",
    version,
    about = "Vendor-discount savings projections",
    long_about = "Estimate the dollar savings that VC portfolio companies and bank \
                  clients earn on a vendor-discount platform. Covers portfolio \
                  savings by investment level, admin time savings, bank savings \
                  predictions, top offers and historical redemption statistics."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Calibration file (JSON or YAML); defaults to the built-in calibration
    #[arg(long, global = true)]
    config: Option<String>,

    /// Directory holding the bank redemption exports
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Log at debug level (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate portfolio savings by investment level
    Savings(SavingsArgs),
    /// Split a portfolio across investment levels
    Allocate(AllocateArgs),
    /// Admin time saved for a portfolio of a given size
    AdminSavings(AdminSavingsArgs),
    /// Sample a segment's savings curve
    Curve(CurveArgs),
    /// Predict annual savings for a bank's client base
    Predict(PredictArgs),
    /// Rank the offers with the highest expected savings
    TopOffers(TopOffersArgs),
    /// Historical redemption statistics per bank
    BankStats(BankStatsArgs),
    /// Print version information
    Version,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match input::config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Savings(args) => commands::vc::run_savings(args, &config.vc),
        Commands::Allocate(args) => commands::vc::run_allocate(args, &config.vc),
        Commands::AdminSavings(args) => commands::vc::run_admin_savings(args, &config.vc),
        Commands::Curve(args) => commands::vc::run_curve(args, &config.vc),
        Commands::Predict(args) => commands::bank::run_predict(args, &config.bank),
        Commands::TopOffers(args) => {
            commands::bank::run_top_offers(args, config.bank, &cli.data_dir)
        }
        Commands::BankStats(args) => {
            commands::bank::run_bank_stats(args, config.bank, &cli.data_dir)
        }
        Commands::Version => {
            println!("vsave {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            let label = match e.downcast_ref::<SavingsError>() {
                Some(SavingsError::InvalidInput { .. }) => "error".yellow().bold(),
                _ => "error".red().bold(),
            };
            eprintln!("{}: {}", label, e);
            process::exit(1);
        }
    }
}
