use thiserror::Error;

/// A call that produced no HTTP response at all.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to '{url}' timed out: {source}")]
    Timeout {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to read response body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("No response from '{url}': {message}")]
    NoResponse { url: String, message: String },
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Endpoint '{endpoint}' got no response: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: TransportError,
    },
    #[error("Failed to build HTTP client: {source}")]
    BuildClientFailed {
        #[source]
        source: reqwest::Error,
    },
}
