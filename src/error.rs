//! Error types for identity-broker operations.
//!
//! The taxonomy follows one rule throughout the crate: "entity not found" is a
//! value (`None` or an empty collection), never an error. Errors are reserved
//! for conditions the caller must act on — bad configuration, an unreachable
//! backend, a backend speaking an unexpected dialect, or a value that cannot
//! be coerced to its declared type.

/// Main error type for broker operations.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// The request cannot be satisfied because of local configuration:
    /// an unknown attribute identifier was required, or a mandatory option
    /// (e.g. entitlement `prefix`/`authority`) is missing. Fatal to the
    /// enclosing request; never retried.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The transport failed to reach the backend (timeout, connection
    /// refused, pool exhaustion). Retryable by caller policy; the core
    /// performs no automatic retry.
    #[error("Backend '{backend}' unreachable: {source}")]
    BackendConnection {
        backend: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend responded but the payload could not be parsed into the
    /// expected shape, or it reported an application error with no local
    /// mapping. Not retryable; indicates version skew between broker and
    /// backend.
    #[error("Backend '{backend}' protocol error: {message}")]
    BackendProtocol {
        backend: &'static str,
        message: String,
    },

    /// A fetched attribute's raw value could not be coerced to its declared
    /// type. Local to one attribute; batch fetches report the failing
    /// attribute as `Null` with a warning instead of aborting.
    #[error("Attribute '{identifier}' value not convertible to {expected}: {raw}")]
    InconvertibleValue {
        identifier: String,
        expected: &'static str,
        raw: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BrokerError {
    /// Create a configuration error with a custom message.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error for the named backend.
    pub fn connection<E>(backend: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::BackendConnection {
            backend,
            source: Box::new(source),
        }
    }

    /// Create a protocol error for the named backend.
    pub fn protocol(backend: &'static str, message: impl Into<String>) -> Self {
        Self::BackendProtocol {
            backend,
            message: message.into(),
        }
    }

    /// Create an inconvertible-value error for a single attribute.
    pub fn inconvertible(
        identifier: impl Into<String>,
        expected: &'static str,
        raw: impl Into<String>,
    ) -> Self {
        Self::InconvertibleValue {
            identifier: identifier.into(),
            expected,
            raw: raw.into(),
        }
    }

    /// Whether the caller may retry the failed operation.
    ///
    /// Only transport-level failures are retryable; configuration and
    /// protocol errors will fail identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendConnection { .. })
    }
}

/// Result type alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
