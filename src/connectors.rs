//! Transport connector traits.
//!
//! The broker does not own any wire transport. Connection pooling, TLS,
//! timeouts and retries all live in the connector implementations supplied by
//! the embedding application; the adapters only describe *what* to ask a
//! backend, never *how* to reach it. A transport failure surfaces as
//! [`ConnectorError::Connection`] and propagates immediately — the core never
//! retries.
//!
//! Both traits are async-first and must be safe for concurrent use; adapter
//! instances share one connector across all requests.

use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

/// Errors a connector can report.
///
/// The two variants deliberately mirror the broker's retryability split:
/// `Connection` means the backend was never reached (retryable by caller
/// policy), `Protocol` means it answered with something unintelligible
/// (not retryable, version skew).
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("connection failed: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl ConnectorError {
    pub fn connection<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection(Box::new(source))
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// An attribute-equality filter over a directory namespace.
///
/// This is intentionally not a query DSL: equality plus AND/OR combination is
/// all the directory adapter ever needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryFilter {
    Eq(String, String),
    And(Vec<DirectoryFilter>),
    Or(Vec<DirectoryFilter>),
}

impl DirectoryFilter {
    pub fn eq(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(attribute.into(), value.into())
    }

    pub fn and(filters: Vec<DirectoryFilter>) -> Self {
        Self::And(filters)
    }

    pub fn or(filters: Vec<DirectoryFilter>) -> Self {
        Self::Or(filters)
    }

    /// Render as an RFC 4515 search filter string.
    pub fn to_filter_string(&self) -> String {
        match self {
            DirectoryFilter::Eq(attribute, value) => {
                format!("({attribute}={})", escape_filter_value(value))
            }
            DirectoryFilter::And(filters) => {
                let inner: String = filters.iter().map(|f| f.to_filter_string()).collect();
                format!("(&{inner})")
            }
            DirectoryFilter::Or(filters) => {
                let inner: String = filters.iter().map(|f| f.to_filter_string()).collect();
                format!("(|{inner})")
            }
        }
    }
}

impl std::fmt::Display for DirectoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_filter_string())
    }
}

fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// One entry returned by a directory search.
///
/// Directory attributes are inherently multi-valued; a single-valued
/// attribute is an entry with exactly one value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub dn: String,
    pub attributes: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Builder-style attribute attachment, used heavily by tests.
    pub fn with_attribute<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        values: Vec<S>,
    ) -> Self {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// First value of the named attribute, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// All values of the named attribute; absent attributes yield an empty
    /// slice.
    pub fn values(&self, name: &str) -> &[String] {
        self.attributes
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Read-only client for the directory backend.
///
/// Implementations are expected to be connection-pooled internally and are
/// shared by reference across concurrent requests.
pub trait DirectoryConnector: Send + Sync {
    /// Search the subtree under `base` for entries matching `filter`.
    ///
    /// An empty result is a normal outcome, not an error.
    fn search(
        &self,
        base: &str,
        filter: &DirectoryFilter,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>, ConnectorError>> + Send;
}

/// Placeholder connector for deployments without a directory backend.
///
/// Lets callers instantiate selector types whose directory side is absent;
/// every search answers empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDirectory;

impl DirectoryConnector for NoDirectory {
    fn search(
        &self,
        _base: &str,
        _filter: &DirectoryFilter,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>, ConnectorError>> + Send {
        std::future::ready(Ok(Vec::new()))
    }
}

/// Client for the RPC/JSON backend.
///
/// Calls are scoped by a manager namespace and method name; parameters are a
/// JSON object and the response an arbitrary JSON value. A deployment may run
/// without the RPC backend at all, in which case [`RpcConnector::enabled`]
/// returns false and the adapter answers every operation with its empty value
/// without attempting a call.
pub trait RpcConnector: Send + Sync {
    /// Invoke `manager`/`method` with the given parameter object.
    fn call(
        &self,
        manager: &str,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ConnectorError>> + Send;

    /// Whether the RPC backend is configured at all.
    fn enabled(&self) -> bool {
        true
    }
}
