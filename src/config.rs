use crate::{DEFAULT_API_URL, DEFAULT_PUSH_URL, DEFAULT_TIMEOUT};
use anyhow::{anyhow, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub push_url: String,
    pub timeout_secs: u64,
    pub software_version: String,
    pub chip_id: Option<String>,
    pub push_strict: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_url = optional("LUFTDATEN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_url("LUFTDATEN_API_URL", &api_url)?;
        let push_url =
            optional("LUFTDATEN_PUSH_URL").unwrap_or_else(|| DEFAULT_PUSH_URL.to_string());
        validate_url("LUFTDATEN_PUSH_URL", &push_url)?;

        let timeout_secs = match optional("LUFTDATEN_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .context("invalid LUFTDATEN_TIMEOUT_SECS")?,
            None => DEFAULT_TIMEOUT.as_secs(),
        };
        if timeout_secs == 0 {
            return Err(anyhow!("LUFTDATEN_TIMEOUT_SECS must be greater than zero"));
        }

        let software_version = optional("LUFTDATEN_SOFTWARE_VERSION")
            .unwrap_or_else(|| format!("luftdaten-rs-{}", env!("CARGO_PKG_VERSION")));
        let chip_id = optional("LUFTDATEN_CHIP_ID");
        let push_strict = optional("LUFTDATEN_PUSH_STRICT")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            api_url,
            push_url,
            timeout_secs,
            software_version,
            chip_id,
            push_strict,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn validate_url(key: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw).with_context(|| format!("invalid {key}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("{key} must be an http(s) URL, got {raw}"));
    }
    Ok(())
}
