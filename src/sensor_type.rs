//! Hardware models accepted by the push endpoint and their `X-Pin` codes.
//!
//! Several particulate sensors share pin 1 with the SDS011; the endpoint
//! only distinguishes the measurement family, not the exact model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorType {
    Sds011,
    Bmp180,
    Bme280,
    Pms1003,
    Pms3003,
    Pms5003,
    Pms7003,
}

const PARTICULATES: &[&str] = &["P1", "P2"];
const PARTICULATES_PM1: &[&str] = &["P0", "P1", "P2"];
const TEMPERATURE_PRESSURE: &[&str] = &["temperature", "pressure"];
const CLIMATE: &[&str] = &["temperature", "humidity", "pressure"];

impl SensorType {
    pub const ALL: [SensorType; 7] = [
        SensorType::Sds011,
        SensorType::Bmp180,
        SensorType::Bme280,
        SensorType::Pms1003,
        SensorType::Pms3003,
        SensorType::Pms5003,
        SensorType::Pms7003,
    ];

    pub const fn pin(self) -> u16 {
        match self {
            SensorType::Sds011
            | SensorType::Pms1003
            | SensorType::Pms3003
            | SensorType::Pms5003
            | SensorType::Pms7003 => 1,
            SensorType::Bmp180 => 3,
            SensorType::Bme280 => 11,
        }
    }

    pub const fn model(self) -> &'static str {
        match self {
            SensorType::Sds011 => "SDS011",
            SensorType::Bmp180 => "BMP180",
            SensorType::Bme280 => "BME280",
            SensorType::Pms1003 => "PMS1003",
            SensorType::Pms3003 => "PMS3003",
            SensorType::Pms5003 => "PMS5003",
            SensorType::Pms7003 => "PMS7003",
        }
    }

    /// Measurement types the model reports (P1 = PM10, P2 = PM2.5, P0 = PM1).
    pub const fn value_types(self) -> &'static [&'static str] {
        match self {
            SensorType::Sds011
            | SensorType::Pms1003
            | SensorType::Pms3003
            | SensorType::Pms5003 => PARTICULATES,
            SensorType::Pms7003 => PARTICULATES_PM1,
            SensorType::Bmp180 => TEMPERATURE_PRESSURE,
            SensorType::Bme280 => CLIMATE,
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sensor type {0:?}")]
pub struct UnknownSensorType(pub String);

impl FromStr for SensorType {
    type Err = UnknownSensorType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        SensorType::ALL
            .into_iter()
            .find(|sensor| sensor.model().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSensorType(trimmed.to_string()))
    }
}
