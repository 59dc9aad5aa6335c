//! Submission of locally measured values to the luftdaten.info push API.

#[cfg(test)]
mod tests;

use crate::error::{LuftdatenError, Result};
use crate::sensor_type::SensorType;
use crate::transport::media_type;
use crate::{DEFAULT_PUSH_URL, DEFAULT_TIMEOUT};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{Instrument, Span};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorDataValue {
    pub value_type: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    pub software_version: String,
    pub sensordatavalues: Vec<SensorDataValue>,
}

impl PushPayload {
    /// One entry per reading, in iteration order. Names are not checked.
    pub fn new<I, K>(software_version: impl Into<String>, readings: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            software_version: software_version.into(),
            sensordatavalues: readings
                .into_iter()
                .map(|(value_type, value)| SensorDataValue {
                    value_type: value_type.into(),
                    value,
                })
                .collect(),
        }
    }
}

pub struct Pusher {
    http: Client,
    endpoint: String,
    pin: u16,
    chip_id: String,
    software_version: String,
    headers: HeaderMap,
    timeout: Duration,
    strict_status: bool,
    span: Span,
}

impl Pusher {
    pub fn new(
        sensor_type: SensorType,
        chip_id: impl Into<String>,
        software_version: impl Into<String>,
        http: Client,
    ) -> Result<Self> {
        Self::from_pin(sensor_type.pin(), chip_id, software_version, http)
    }

    pub fn from_pin(
        pin: u16,
        chip_id: impl Into<String>,
        software_version: impl Into<String>,
        http: Client,
    ) -> Result<Self> {
        let chip_id = chip_id.into();
        let headers = push_headers(pin, &chip_id)?;
        let span = tracing::info_span!("luftdaten.pusher", chip_id = %chip_id, pin);
        Ok(Self {
            http,
            endpoint: DEFAULT_PUSH_URL.to_string(),
            pin,
            chip_id,
            software_version: software_version.into(),
            headers,
            timeout: DEFAULT_TIMEOUT,
            strict_status: false,
            span,
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Treat non-2xx answers as [`LuftdatenError::Rejected`] instead of
    /// only logging them.
    pub fn strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    pub fn pin(&self) -> u16 {
        self.pin
    }

    pub fn chip_id(&self) -> &str {
        &self.chip_id
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn payload<I, K>(&self, readings: I) -> PushPayload
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        PushPayload::new(self.software_version.clone(), readings)
    }

    pub async fn push<I, K>(&self, readings: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let payload = self.payload(readings);
        self.send(&payload).instrument(self.span.clone()).await
    }

    async fn send(&self, payload: &PushPayload) -> Result<()> {
        tracing::debug!(headers = ?self.headers, "push headers");
        tracing::debug!(payload = ?payload, "push payload");
        tracing::debug!(url = %self.endpoint, "Pushing data to luftdaten.info");

        let response = self
            .http
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        let content_type = media_type(response.headers());
        tracing::debug!(
            %status,
            content_type = content_type.as_deref().unwrap_or("-"),
            "Response from luftdaten.info"
        );

        let body = response.bytes().await?;
        match content_type.as_deref() {
            Some("application/json") => match serde_json::from_slice::<Value>(&body) {
                Ok(json) => tracing::debug!(response = %json, "push response"),
                Err(err) => tracing::debug!(error = %err, "push response is not valid JSON"),
            },
            Some(kind) if kind.starts_with("text/") => {
                tracing::debug!(text = %String::from_utf8_lossy(&body), "push response text");
            }
            _ => {}
        }

        if !status.is_success() {
            tracing::warn!(%status, "luftdaten.info push returned non-success");
            if self.strict_status {
                return Err(LuftdatenError::Rejected { status });
            }
        }
        Ok(())
    }
}

fn push_headers(pin: u16, chip_id: &str) -> Result<HeaderMap> {
    let sensor = HeaderValue::from_str(chip_id).map_err(|source| LuftdatenError::InvalidHeader {
        chip_id: chip_id.to_string(),
        source,
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(HeaderName::from_static("x-pin"), HeaderValue::from(pin));
    headers.insert(HeaderName::from_static("x-sensor"), sensor);
    Ok(headers)
}
