pub mod commands;

use clap::{Parser, Subcommand};
use ecoswap_core::config::{AppConfig, LoadOptions, LogFormat};
use std::process::ExitCode;

use commands::demo::DemoOptions;

#[derive(Debug, Parser)]
#[command(
    name = "ecoswap",
    about = "EcoSwap operator CLI",
    long_about = "Inspect EcoSwap configuration and run greener-alternative analyses against the seed catalog.",
    after_help = "Examples:\n  ecoswap config\n  ecoswap demo --json\n  ecoswap demo --cart shop-tote --cart shop-bottle"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Analyze a cart against the seed catalog and report greener alternatives")]
    Demo {
        #[arg(long = "cart", value_name = "PRODUCT_ID", help = "Cart product id (repeatable)")]
        cart: Vec<String>,
        #[arg(long, help = "Override the minimum eco-score gain a substitute must exceed")]
        margin: Option<u8>,
        #[arg(long, help = "Override the fuzzy-match distance threshold (0.0 to 1.0)")]
        threshold: Option<f64>,
        #[arg(long, help = "Embed the full analysis report in the JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Demo { cart, margin, threshold, json } => commands::demo::run(DemoOptions {
            cart,
            improvement_margin: margin,
            threshold,
            json,
        }),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single command payload.
fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
