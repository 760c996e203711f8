//! Common test utilities: mock connectors and shared fixtures.
//!
//! The mocks implement the connector traits over in-memory data so the
//! adapters can be exercised without a directory server or RPC endpoint.
//! Filter evaluation in the directory mock works on the structured filter,
//! matching what a real server would do with the rendered search string.

pub mod fixtures;

/// Route broker logs through the test logger when `RUST_LOG` is set.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

use idbroker::{ConnectorError, DirectoryConnector, DirectoryEntry, DirectoryFilter, RpcConnector};
use serde_json::Value;
use std::collections::HashMap;
use std::future::{Future, ready};

/// In-memory directory backend: entries grouped by search base.
#[derive(Debug, Default, Clone)]
pub struct MockDirectory {
    entries: HashMap<String, Vec<DirectoryEntry>>,
    fail: bool,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A directory whose every search fails at the transport layer.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, base: &str, entry: DirectoryEntry) -> Self {
        self.entries.entry(base.to_string()).or_default().push(entry);
        self
    }
}

fn filter_matches(filter: &DirectoryFilter, entry: &DirectoryEntry) -> bool {
    match filter {
        DirectoryFilter::Eq(attribute, value) => {
            entry.values(attribute).iter().any(|have| have == value)
        }
        DirectoryFilter::And(filters) => filters.iter().all(|f| filter_matches(f, entry)),
        DirectoryFilter::Or(filters) => filters.iter().any(|f| filter_matches(f, entry)),
    }
}

impl DirectoryConnector for MockDirectory {
    fn search(
        &self,
        base: &str,
        filter: &DirectoryFilter,
    ) -> impl Future<Output = Result<Vec<DirectoryEntry>, ConnectorError>> + Send {
        let result = if self.fail {
            Err(ConnectorError::connection(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "directory unreachable",
            )))
        } else {
            Ok(self
                .entries
                .get(base)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|entry| filter_matches(filter, entry))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default())
        };
        ready(result)
    }
}

#[derive(Debug, Clone)]
struct Route {
    manager: String,
    method: String,
    params: Value,
    response: Value,
}

/// In-memory RPC backend: explicit routes matched by manager, method and a
/// parameter subset. Unrouted calls answer JSON `null`, the backend's
/// "nothing here" value.
#[derive(Debug, Clone)]
pub struct MockRpc {
    routes: Vec<Route>,
    enabled: bool,
    fail: bool,
}

impl Default for MockRpc {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            enabled: true,
            fail: false,
        }
    }
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// An RPC backend that is not configured at all.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// An RPC backend whose every call fails at the transport layer.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Register a response for calls whose parameters contain `params`.
    pub fn route(mut self, manager: &str, method: &str, params: Value, response: Value) -> Self {
        self.routes.push(Route {
            manager: manager.to_string(),
            method: method.to_string(),
            params,
            response,
        });
        self
    }
}

/// Every key/value pair of `expected` present and equal in `actual`.
fn params_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| actual.get(key) == Some(value)),
        _ => expected == actual,
    }
}

impl RpcConnector for MockRpc {
    fn call(
        &self,
        manager: &str,
        method: &str,
        params: Value,
    ) -> impl Future<Output = Result<Value, ConnectorError>> + Send {
        let result = if self.fail {
            Err(ConnectorError::connection(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "rpc endpoint timed out",
            )))
        } else {
            Ok(self
                .routes
                .iter()
                .find(|route| {
                    route.manager == manager
                        && route.method == method
                        && params_subset(&route.params, &params)
                })
                .map(|route| route.response.clone())
                .unwrap_or(Value::Null))
        };
        ready(result)
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}
