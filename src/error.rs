use reqwest::header::InvalidHeaderValue;
use reqwest::StatusCode;

pub type Result<T, E = LuftdatenError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum LuftdatenError {
    /// The transport failed or the request timed out. Terminal for the call.
    #[error("can not load data from luftdaten.info: {0}")]
    Connection(#[source] reqwest::Error),
    /// The server answered with something other than JSON (gateway or
    /// maintenance page). Counts as a connection failure.
    #[error("luftdaten.info answered HTTP {status} with {content_type:?} instead of JSON")]
    Unavailable {
        status: StatusCode,
        content_type: Option<String>,
    },
    /// The request went through but the response can not be used.
    #[error("malformed response from luftdaten.info: {0}")]
    Malformed(String),
    /// Push endpoint answered with a non-success status (strict mode only).
    #[error("luftdaten.info rejected the push with HTTP {status}")]
    Rejected { status: StatusCode },
    #[error("chip id {chip_id:?} is not a valid X-Sensor header value")]
    InvalidHeader {
        chip_id: String,
        #[source]
        source: InvalidHeaderValue,
    },
}

impl LuftdatenError {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Self::Malformed(detail.into())
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Unavailable { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Connection(err) if err.is_timeout())
    }
}

impl From<reqwest::Error> for LuftdatenError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(error = %err, "Can not load data from luftdaten.info");
        Self::Connection(err)
    }
}
