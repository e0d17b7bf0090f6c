use thiserror::Error;

/// Errors that can occur while talking to the storefront.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// The request timed out. Transient; callers may retry once after a
    /// fixed delay.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// A connection-level failure (DNS, refused, reset, TLS).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The storefront rejected the request.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body, for the logs.
        body: String,
    },

    /// A create was rejected because the SKU already exists; the rejection
    /// carries the id of the existing product, which callers adopt as if
    /// the create had succeeded.
    #[error("duplicate SKU, destination already has resource {resource_id}")]
    DuplicateSku {
        /// Id of the product that already owns the SKU.
        resource_id: i64,
    },

    /// The addressed resource does not exist on the destination.
    #[error("resource not found")]
    NotFound,

    /// The response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Parse(String),
}

impl StorefrontError {
    /// True for timeout-class errors that warrant a single retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<reqwest::Error> for StorefrontError {
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

/// Errors constructing a [`crate::StorefrontClient`].
#[derive(Debug, Error)]
pub enum StorefrontInitError {
    /// A required credential or URL variable is unset.
    #[error(transparent)]
    MissingEnv(#[from] shim_utils::env::MissingEnvVarError),

    /// The underlying HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
