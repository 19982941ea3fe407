mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::financing::{AmortizeArgs, BalloonArgs, BestTermsArgs};

/// Seller-financing terms calculator
#[derive(Parser)]
#[command(
    name = "sfc",
    version,
    about = "Seller-financing amortization schedules and offer-terms search",
    long_about = "A CLI for pricing seller-financed real-estate deals with decimal \
                  precision. Builds amortization schedules with balloon and \
                  interest-only options, values balloon payoffs, and searches \
                  down payment, rate, offer price and balloon horizon for the \
                  terms that maximise seller earnings at a 7% buyer cash-on-cash return."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a month-by-month amortization schedule
    Amortize(AmortizeArgs),
    /// Remaining balance owed when a balloon falls due
    Balloon(BalloonArgs),
    /// Search for the financing terms that maximise seller earnings
    BestTerms(BestTermsArgs),
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

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::financing::run_amortize(args),
        Commands::Balloon(args) => commands::financing::run_balloon(args),
        Commands::BestTerms(args) => commands::financing::run_best_terms(args),
        Commands::Version => {
            println!("sfc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
