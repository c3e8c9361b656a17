//! Unified startup error type.

use thiserror::Error;

/// The error type returned by gantry's fallible setup and serving operations.
///
/// Per-request failures never surface as `Error`: they are mapped to JSON
/// error responses by the dispatcher (see [`DispatchError`](crate::DispatchError)).
/// This type covers building the route table, loading configuration, binding
/// to a port and running the runtime.
#[derive(Debug, Error)]
pub enum Error {
    /// Two endpoints resolved to the same full path.
    #[error("duplicate route: `{0}` is already registered")]
    DuplicateRoute(String),

    /// The transport's path router refused a route.
    #[error("invalid route `{path}`: {source}")]
    Route {
        path: String,
        #[source]
        source: matchit::InsertError,
    },

    #[error("config: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address `{0}`")]
    Address(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
