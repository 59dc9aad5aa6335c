use clap::{Args, Parser, Subcommand};
use luftdaten::SensorType;

#[derive(Parser)]
#[command(name = "luftdaten", version, about = "luftdaten.info sensor API client")]
pub struct Cli {
    /// Per-request timeout; overrides LUFTDATEN_TIMEOUT_SECS.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the newest reading of a public sensor.
    Fetch(FetchArgs),
    /// Exit non-zero when the sensor has no readings.
    Validate(ValidateArgs),
    /// Submit measurements to the push endpoint.
    Push(PushArgs),
    /// List supported sensor models and their pin codes.
    SensorTypes,
}

#[derive(Args)]
pub struct FetchArgs {
    pub sensor_id: u64,
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub sensor_id: u64,
}

#[derive(Args)]
pub struct PushArgs {
    #[arg(long)]
    pub sensor_type: SensorType,
    /// Defaults to LUFTDATEN_CHIP_ID.
    #[arg(long)]
    pub chip_id: Option<String>,
    #[arg(long)]
    pub software_version: Option<String>,
    #[arg(long, default_value_t = false)]
    pub strict: bool,
    /// Measurements as NAME=VALUE, e.g. P1=10.5
    #[arg(required = true, value_parser = parse_reading)]
    pub readings: Vec<(String, f64)>,
}

pub fn parse_reading(raw: &str) -> Result<(String, f64), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing measurement name in {raw:?}"));
    }
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("{name}: {value:?} is not a number"))?;
    Ok((name.to_string(), value))
}
