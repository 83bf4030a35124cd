/// Failures inside the transport layer.
///
/// A `FetchError` never leaves [`Fetcher`](crate::net::Fetcher): every public fetch
/// operation logs it and reduces it to a failure
/// [`RequestResult`](crate::net::RequestResult).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URI {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("Unsupported method {0} (expected POST or PATCH)")]
    UnsupportedMethod(http::Method),

    #[error("Accept header does not negotiate JSON or CSV: {0:?}")]
    NotNegotiable(Option<String>),

    #[error("Content type mismatch: expected {expected}, got {actual:?}")]
    ContentTypeMismatch {
        expected: &'static str,
        actual: Option<String>,
    },

    #[error("Cannot serialize request body: {0}")]
    Encode(String),

    #[error("Cannot decode response body: {0}")]
    Decode(String),

    #[error("No scripted response for {method} {path}")]
    Unscripted { method: http::Method, path: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Cart item {0} not found")]
    NotFound(String),

    #[error("Quantity must be at least 1")]
    ZeroQuantity,

    #[error("Cannot encode cart: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Export file name {0:?} is not a plain file name")]
    InvalidFileName(String),

    #[error("Cannot write export: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures while assembling an [`AppContext`](crate::context::AppContext).
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Cannot create HTTP backend: {0}")]
    Backend(#[from] FetchError),

    #[error("Cannot open storage: {0}")]
    Storage(#[from] anyhow::Error),
}
