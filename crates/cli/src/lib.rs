pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use estimo_core::Region;
use tracing_subscriber::EnvFilter;

use crate::commands::quote::QuoteArgs;

#[derive(Debug, Parser)]
#[command(
    name = "estimo",
    about = "Estimo project quote estimator",
    long_about = "Price web projects from a regional catalog, export quotes, and manage the saved estimator state.",
    after_help = "Examples:\n  estimo quote --project-type corporate --pages 7 --region co\n  estimo quote --coupon FIRST20 --format whatsapp\n  estimo catalog --region es\n  estimo doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply selections to the saved estimator state and render the quote")]
    Quote(QuoteArgs),
    #[command(about = "List every option with its price for a region")]
    Catalog {
        #[arg(long, help = "Region to price the catalog for (defaults to the configured region)")]
        region: Option<Region>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog, contact links, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Diagnostics go to stderr so rendered quotes on stdout stay pipeable.
fn init_logging() {
    let filter = EnvFilter::try_from_env("ESTIMO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Quote(args) => commands::quote::run(args),
        Command::Catalog { region, json } => commands::catalog::run(region, json),
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::CommandResult::rendered(commands::config::run()),
        Command::Doctor { json } => commands::CommandResult::rendered(commands::doctor::run(json)),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
