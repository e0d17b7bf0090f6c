use thiserror::Error;

/// Errors that can occur while talking to the marketplace API.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// The request timed out. Transient; callers may retry once.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A connection-level failure (DNS, refused, reset, TLS).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The marketplace returned a non-success response.
    #[error("API error: {0}")]
    Api(String),

    /// The response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Parse(String),
}

impl MarketplaceError {
    /// True for timeout-class errors that warrant a single retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for MarketplaceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

/// Errors constructing a [`crate::MarketplaceClient`].
#[derive(Debug, Error)]
pub enum MarketplaceInitError {
    /// A required credential or endpoint variable is unset.
    #[error(transparent)]
    MissingEnv(#[from] shim_utils::env::MissingEnvVarError),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
