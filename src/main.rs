mod cli;

use crate::cli::{Cli, Commands, FetchArgs, PushArgs, ValidateArgs};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use luftdaten::config::Config;
use luftdaten::{Pusher, Reader, SensorType};
use reqwest::Client;
use std::process::ExitCode;

fn init_tracing() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,luftdaten=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    init_tracing()?;
    if let Some(timeout_secs) = cli.timeout_secs {
        config.timeout_secs = timeout_secs;
    }

    let http = Client::new();
    match cli.command {
        Commands::Fetch(args) => fetch(&config, http, args).await,
        Commands::Validate(args) => validate(&config, http, args).await,
        Commands::Push(args) => push(&config, http, args).await,
        Commands::SensorTypes => {
            for sensor in SensorType::ALL {
                println!(
                    "{:<8} pin {:>2}  {}",
                    sensor.model(),
                    sensor.pin(),
                    sensor.value_types().join(", ")
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn reader(config: &Config, http: Client, sensor_id: u64) -> Reader {
    Reader::new(sensor_id, http)
        .with_base_url(config.api_url.clone())
        .with_timeout(config.timeout())
}

async fn fetch(config: &Config, http: Client, args: FetchArgs) -> Result<ExitCode> {
    let mut reader = reader(config, http, args.sensor_id);
    reader
        .fetch()
        .await
        .with_context(|| format!("fetching sensor {}", args.sensor_id))?;

    if args.json {
        let snapshot = serde_json::json!({
            "meta": reader.meta(),
            "values": reader.values(),
        });
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(ExitCode::SUCCESS);
    }

    match reader.meta() {
        Some(meta) => println!(
            "sensor {} at lon {} lat {}",
            meta.sensor_id, meta.longitude, meta.latitude
        ),
        None => println!("sensor {} has no readings", reader.sensor_id()),
    }
    for (value_type, value) in reader.values() {
        match value {
            Some(value) => println!("{value_type:<12} {value}"),
            None => println!("{value_type:<12} -"),
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn validate(config: &Config, http: Client, args: ValidateArgs) -> Result<ExitCode> {
    let mut reader = reader(config, http, args.sensor_id);
    reader
        .fetch()
        .await
        .with_context(|| format!("fetching sensor {}", args.sensor_id))?;
    if reader.validate() {
        println!("valid");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("invalid");
        Ok(ExitCode::FAILURE)
    }
}

async fn push(config: &Config, http: Client, args: PushArgs) -> Result<ExitCode> {
    let chip_id = args
        .chip_id
        .or_else(|| config.chip_id.clone())
        .context("--chip-id or LUFTDATEN_CHIP_ID is required for push")?;
    let software_version = args
        .software_version
        .unwrap_or_else(|| config.software_version.clone());

    let pusher = Pusher::new(args.sensor_type, chip_id, software_version, http)?
        .with_endpoint(config.push_url.clone())
        .with_timeout(config.timeout())
        .strict_status(args.strict || config.push_strict);

    let count = args.readings.len();
    pusher
        .push(args.readings)
        .await
        .context("pushing to luftdaten.info")?;
    tracing::info!(
        sensor_type = %args.sensor_type,
        pin = pusher.pin(),
        chip_id = pusher.chip_id(),
        count,
        "pushed measurements"
    );
    Ok(ExitCode::SUCCESS)
}
