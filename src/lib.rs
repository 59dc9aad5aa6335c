//! Client for the luftdaten.info (sensor.community) air-quality API.
//!
//! [`Reader`] fetches the newest reading of a public sensor and flattens it
//! into measurement type -> value. [`Pusher`] submits local measurements to
//! the ingestion endpoint. Both borrow a caller-owned [`reqwest::Client`]
//! and make exactly one request per call, bounded by a timeout.

pub mod config;
mod error;
pub mod pusher;
pub mod reader;
pub mod sensor_type;
mod transport;

#[cfg(test)]
mod test_support;

use std::time::Duration;

pub use crate::error::{LuftdatenError, Result};
pub use crate::pusher::{PushPayload, Pusher, SensorDataValue};
pub use crate::reader::{Reader, SensorMeta};
pub use crate::sensor_type::{SensorType, UnknownSensorType};

pub const DEFAULT_API_URL: &str = "https://api.luftdaten.info/v1";
pub const DEFAULT_PUSH_URL: &str = "http://api.luftdaten.info/v1/push-sensor-data/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
