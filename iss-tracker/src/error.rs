///! Error taxonomy shared by the fetchers, the classifier and the renderer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("upstream {url} answered with HTTP {status}")]
    Upstream {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
    #[error("reverse geocoding timed out after {timeout_secs}s")]
    GeocodeTimeout { timeout_secs: u64 },
    #[error("render error: {0}")]
    Render(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

impl TrackerError {
    pub(crate) fn network(url: &str, source: reqwest::Error) -> Self {
        TrackerError::Network {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn malformed(url: &str, reason: impl Into<String>) -> Self {
        TrackerError::MalformedResponse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;
