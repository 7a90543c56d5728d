mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::costs::{CostsArgs, StampDutyArgs, TaxArgs};
use commands::loan::AmortizeArgs;
use commands::scenario::{EvaluateArgs, ProjectArgs};
use commands::solver::{FairPriceArgs, SensitivityArgs};

/// Company buy-to-let property investment analysis
#[derive(Parser)]
#[command(
    name = "propinvest",
    version,
    about = "Company buy-to-let property investment analysis",
    long_about = "A CLI for analysing buy-to-let purchases held in a limited company \
                  with decimal precision. Supports mortgage amortization, corporation \
                  tax, stamp duty, running costs, return metrics, multi-year projections \
                  and fair price search."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// JSON or YAML file with tax tables and solver settings
    #[arg(long, global = true)]
    policy: Option<String>,

    /// Log solver progress to stderr (same as RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a mortgage amortization schedule
    Amortize(AmortizeArgs),
    /// Corporation tax on a year's profit
    Tax(TaxArgs),
    /// Stamp duty on a purchase price, band by band
    StampDuty(StampDutyArgs),
    /// Running and acquisition costs for a purchase
    Costs(CostsArgs),
    /// Return metrics for one year of a purchase
    Evaluate(EvaluateArgs),
    /// Project equity and returns over several years
    Project(ProjectArgs),
    /// Find the highest price meeting a target yield or return
    FairPrice(FairPriceArgs),
    /// Fair price grid over two varying inputs
    Sensitivity(SensitivityArgs),
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
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run(cli: Cli) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let policy = input::load_policy(cli.policy.as_deref())?;

    match cli.command {
        Commands::Amortize(args) => commands::loan::run_amortize(args),
        Commands::Tax(args) => commands::costs::run_tax(args, &policy),
        Commands::StampDuty(args) => commands::costs::run_stamp_duty(args, &policy),
        Commands::Costs(args) => commands::costs::run_costs(args, &policy),
        Commands::Evaluate(args) => commands::scenario::run_evaluate(args, &policy),
        Commands::Project(args) => commands::scenario::run_project(args, &policy),
        Commands::FairPrice(args) => commands::solver::run_fair_price(args, &policy),
        Commands::Sensitivity(args) => commands::solver::run_sensitivity(args, &policy),
        Commands::Version => Ok(serde_json::json!({
            "name": "propinvest",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = cli.output.clone();
    match run(cli) {
        Ok(value) => {
            output::format_output(&format, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
