//! Latest-reading retrieval for a single public sensor.
//!
//! A [`Reader`] keeps the measurement map across calls: once a measurement
//! type has been seen it stays a key for the lifetime of the reader. An
//! empty answer from the API resets every known value to `None` without
//! removing keys, and a record that lacks a known type leaves that type's
//! previous value untouched.


use crate::error::{LuftdatenError, Result};
use crate::transport::{is_truthy, join_url, media_type};
use crate::{DEFAULT_API_URL, DEFAULT_TIMEOUT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{Instrument, Span};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorMeta {
    pub sensor_id: String,
    pub longitude: f64,
    pub latitude: f64,
}

#[derive(Debug, Deserialize)]
struct Record {
    location: Location,
    sensordatavalues: Vec<DataValue>,
}

#[derive(Debug, Deserialize)]
struct Location {
    longitude: Numeric,
    latitude: Numeric,
}

#[derive(Debug, Deserialize)]
struct DataValue {
    value_type: String,
    value: Numeric,
}

/// The API is inconsistent about quoting numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_f64(&self, field: &str) -> Result<f64> {
        match self {
            Numeric::Number(value) => Ok(*value),
            Numeric::Text(raw) => raw.trim().parse::<f64>().map_err(|_| {
                LuftdatenError::malformed(format!("{field} is not numeric: {raw:?}"))
            }),
        }
    }
}

#[derive(Debug)]
struct LatestReading {
    values: Vec<(String, f64)>,
    longitude: f64,
    latitude: f64,
}

pub struct Reader {
    http: Client,
    sensor_id: String,
    base_url: String,
    timeout: Duration,
    span: Span,
    data: Option<Value>,
    values: BTreeMap<String, Option<f64>>,
    meta: Option<SensorMeta>,
}

impl Reader {
    pub fn new(sensor_id: impl ToString, http: Client) -> Self {
        let sensor_id = sensor_id.to_string();
        let span = tracing::info_span!("luftdaten.reader", sensor_id = %sensor_id);
        Self {
            http,
            sensor_id,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            span,
            data: None,
            values: BTreeMap::new(),
            meta: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Span every request of this reader is recorded under.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn url(&self) -> String {
        join_url(&self.base_url, &format!("sensor/{}/", self.sensor_id))
    }

    pub fn values(&self) -> &BTreeMap<String, Option<f64>> {
        &self.values
    }

    pub fn value(&self, value_type: &str) -> Option<f64> {
        self.values.get(value_type).copied().flatten()
    }

    pub fn meta(&self) -> Option<&SensorMeta> {
        self.meta.as_ref()
    }

    /// Raw JSON body of the last fetch, if it could be decoded.
    pub fn raw(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// True when the last fetch returned at least one record. No request is made.
    pub fn validate(&self) -> bool {
        self.data.as_ref().is_some_and(is_truthy)
    }

    pub async fn fetch(&mut self) -> Result<()> {
        let span = self.span.clone();
        self.fetch_latest().instrument(span).await
    }

    async fn fetch_latest(&mut self) -> Result<()> {
        self.data = None;
        let url = self.url();
        tracing::debug!(%url, "Requesting luftdaten.info");

        let response = self.http.get(&url).timeout(self.timeout).send().await?;
        let status = response.status();
        let content_type = media_type(response.headers());
        tracing::debug!(
            %status,
            content_type = content_type.as_deref().unwrap_or("-"),
            "Response from luftdaten.info"
        );
        if content_type.as_deref() != Some("application/json") {
            tracing::error!(%status, "Can not load data from luftdaten.info");
            return Err(LuftdatenError::Unavailable {
                status,
                content_type,
            });
        }
        let body = response.bytes().await?;
        let data: Value = serde_json::from_slice(&body)
            .map_err(|err| LuftdatenError::malformed(format!("body is not JSON: {err}")))?;
        tracing::trace!(body = %data, "luftdaten.info payload");

        let extracted = extract_latest(&data);
        self.data = Some(data);

        let Some(latest) = extracted? else {
            tracing::debug!("no readings available; clearing known values");
            for value in self.values.values_mut() {
                *value = None;
            }
            return Ok(());
        };

        for (value_type, value) in latest.values {
            *self.values.entry(value_type).or_insert(None) = Some(value);
        }
        self.meta = Some(SensorMeta {
            sensor_id: self.sensor_id.clone(),
            longitude: latest.longitude,
            latitude: latest.latitude,
        });
        Ok(())
    }
}

/// `None` for an empty answer, otherwise the newest record fully parsed.
fn extract_latest(data: &Value) -> Result<Option<LatestReading>> {
    if !is_truthy(data) {
        return Ok(None);
    }
    let records = data
        .as_array()
        .ok_or_else(|| LuftdatenError::malformed("expected an array of records"))?;

    let newest = newest_record(records)?;
    let record = Record::deserialize(newest)
        .map_err(|err| LuftdatenError::malformed(format!("latest record: {err}")))?;

    let values = record
        .sensordatavalues
        .iter()
        .map(|entry| {
            let value = entry.value.to_f64(&entry.value_type)?;
            Ok((entry.value_type.clone(), value))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(LatestReading {
        values,
        longitude: record.location.longitude.to_f64("longitude")?,
        latitude: record.location.latitude.to_f64("latitude")?,
    }))
}

/// ISO-8601 timestamps order lexicographically; descending stable sort, first wins.
fn newest_record(records: &[Value]) -> Result<&Value> {
    let mut stamped = records
        .iter()
        .map(|record| {
            record
                .get("timestamp")
                .and_then(Value::as_str)
                .map(|timestamp| (timestamp, record))
                .ok_or_else(|| LuftdatenError::malformed("record without a timestamp"))
        })
        .collect::<Result<Vec<_>>>()?;
    stamped.sort_by(|a, b| b.0.cmp(a.0));
    stamped
        .first()
        .map(|(_, record)| *record)
        .ok_or_else(|| LuftdatenError::malformed("no records"))
}
