mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::compare::CompareArgs;
use commands::loan::{ArmArgs, ClosingCostsArgs, PaymentArgs};
use commands::property::PropertyArgs;
use commands::report::ReportArgs;

/// Side-by-side mortgage program comparison
#[derive(Parser)]
#[command(
    name = "mcalc",
    version,
    about = "Side-by-side mortgage program comparison",
    long_about = "Compares Conventional, FHA, VA, USDA and 5/1 ARM financing for one \
                  purchase with decimal precision: payments, mortgage insurance, \
                  closing costs, cash to close, 5-year and lifetime cost, and ARM \
                  adjustment scenarios."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare all five loan programs
    Compare(CompareArgs),
    /// Monthly principal-and-interest payment
    Payment(PaymentArgs),
    /// Month-by-month amortization schedule
    Schedule(PaymentArgs),
    /// Itemised closing costs for one program
    ClosingCosts(ClosingCostsArgs),
    /// ARM payment scenarios after the fixed period
    ArmScenarios(ArmArgs),
    /// Listing search and listing-priced comparisons
    Property(PropertyArgs),
    /// Build a lead report from a comparison
    Report(ReportArgs),
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

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::ClosingCosts(args) => commands::loan::run_closing_costs(args),
        Commands::ArmScenarios(args) => commands::loan::run_arm(args),
        Commands::Property(args) => commands::property::run_property(args),
        Commands::Report(args) if args.text => match commands::report::build(&args) {
            Ok((_, text)) => {
                print!("{}", text);
                process::exit(0);
            }
            Err(e) => fail(e),
        },
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Version => {
            println!("mcalc {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => fail(e),
    }
}

fn fail(e: Box<dyn std::error::Error>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), e);
    process::exit(1);
}
