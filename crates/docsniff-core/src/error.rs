use thiserror::Error;

/// Application-wide error types for docsniff.
///
/// These are the currency between the engine and its collaborators
/// (fetcher, extractor, arbiter). None of them escape the public
/// classification entry point: the engine degrades every stage failure
/// into a weaker evidence source instead of surfacing an error.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// The input string is not a parseable URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request completed with a non-success status.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Connection-level network failure.
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Response body exceeded the configured size cap.
    #[error("response exceeded {limit} bytes")]
    OversizeResponse { limit: usize },

    /// Response content type cannot be analyzed as a page.
    #[error("unsupported content type: {0}")]
    UnsupportedContent(String),

    /// Fetched content could not be parsed into features.
    #[error("content parse error: {0}")]
    ContentParse(String),

    /// Arbiter API call failed.
    #[error("arbiter error (HTTP {status_code}): {message}")]
    Arbiter { message: String, status_code: u16 },

    /// Arbiter reply did not match the expected verdict shape.
    #[error("arbiter returned malformed verdict: {0}")]
    ArbiterSchema(String),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration detected at construction time.
    #[error("configuration error: {0}")]
    Config(String),
}
