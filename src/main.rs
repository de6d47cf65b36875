// Iron Bank - Trade Storage CLI
// "The Iron Bank will have its due"

use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use iron_bank::{
    logging::init_logging, parse_trades, telemetry, FetchOutcome, SaveOutcome, Settings,
    TradeStorage,
};
use std::path::PathBuf;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_TIMESTAMP: &str = env!("VERGEN_BUILD_TIMESTAMP");
const GIT_SHA: &str = env!("VERGEN_GIT_SHA");

fn cli() -> Command {
    Command::new("iron-bank")
        .version(VERSION)
        .about("Persist trade batches to InfluxDB and read back aggregate series")
        .long_about(format!(
            "Iron Bank - Trade Storage\n\
             Version: {VERSION}\n\
             Build: {BUILD_TIMESTAMP}\n\
             Git SHA: {GIT_SHA}\n\
             Rust: {}\n\n\
             Settings come from an optional TOML file and IRON_BANK__* environment variables.",
            env!("VERGEN_RUSTC_SEMVER")
        ))
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .global(true),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .help("Validate the storage configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("metrics")
                .long("metrics")
                .help("Print Prometheus metrics after the command completes")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("save")
                .about("Write a JSON array of trades as one batch")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .help("File holding [[exchange, timestamp, price, size, side, liquidation], ...]")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("fetch")
                .about("Print the windowed sum/count/median series of a time range as JSON")
                .arg(
                    Arg::new("from")
                        .long("from")
                        .value_name("MS")
                        .help("Range start, milliseconds since the epoch")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("to")
                        .long("to")
                        .value_name("MS")
                        .help("Range end, milliseconds since the epoch")
                        .required(true)
                        .allow_negative_numbers(true)
                        .value_parser(clap::value_parser!(i64)),
                )
                .arg(
                    Arg::new("timeframe")
                        .short('t')
                        .long("timeframe")
                        .value_name("MS")
                        .help("Window length in milliseconds (default 60000)")
                        .value_parser(clap::value_parser!(i64)),
                ),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<PathBuf>("config");
    let mut settings = Settings::load(config_path.map(PathBuf::as_path))
        .context("failed to load configuration")?;

    if let Some(level) = matches.get_one::<String>("log-level") {
        settings.logging.level = level.clone();
        settings.logging.env_filter = None;
    }

    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("✗ Failed to initialize logging: {e}");
        return Err(e.into());
    }

    if matches.get_flag("validate") {
        let storage = settings.storage.validate()?;
        info!(url = %storage.influx.url, bucket = %storage.influx.bucket, "✓ Configuration is valid");
        println!("Configuration is valid!");
        return Ok(());
    }

    let result = match matches.subcommand() {
        Some(("save", sub)) => run_save(&settings, sub).await,
        Some(("fetch", sub)) => run_fetch(&settings, sub).await,
        _ => {
            cli().print_help()?;
            Ok(())
        }
    };

    if matches.get_flag("metrics") {
        print!("{}", telemetry::render()?);
    }

    result
}

async fn connected_storage(settings: &Settings) -> anyhow::Result<TradeStorage> {
    let storage = TradeStorage::configure(&settings.storage)?;
    storage.connect().await?;
    Ok(storage)
}

async fn run_save(settings: &Settings, matches: &ArgMatches) -> anyhow::Result<()> {
    let Some(path) = matches.get_one::<PathBuf>("file") else {
        bail!("missing trade file");
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let trades = parse_trades(&json)?;

    let storage = connected_storage(settings).await?;

    match storage.save(&trades).await {
        SaveOutcome::Skipped => {
            println!("No trades in {}, nothing written", path.display());
            Ok(())
        }
        SaveOutcome::Written { points } => {
            println!("Wrote {points} points");
            Ok(())
        }
        SaveOutcome::Dropped { points, reason } => {
            error!(points, "✗ Batch was not persisted");
            bail!("{points} points dropped: {reason}")
        }
    }
}

async fn run_fetch(settings: &Settings, matches: &ArgMatches) -> anyhow::Result<()> {
    let (Some(from), Some(to)) = (
        matches.get_one::<i64>("from").copied(),
        matches.get_one::<i64>("to").copied(),
    ) else {
        bail!("--from and --to are required");
    };
    let timeframe = matches.get_one::<i64>("timeframe").copied();

    let storage = connected_storage(settings).await?;

    match storage.fetch(from, to, timeframe).await {
        FetchOutcome::Ticks(ticks) => {
            println!("{}", serde_json::to_string_pretty(&ticks)?);
            Ok(())
        }
        FetchOutcome::Unavailable { reason } => bail!("no data available: {reason}"),
    }
}
