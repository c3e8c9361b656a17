//! Server configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an
//! optional config file (any format the `config` crate understands, picked by
//! extension), and `GANTRY_`-prefixed environment variables such as
//! `GANTRY_PORT=9000`.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Size of the runtime's worker pool.
    pub worker_threads: usize,
    /// Requests dispatched concurrently. Defaults to `worker_threads`.
    pub max_in_flight: Option<usize>,
    /// Requests allowed to wait for a dispatch slot before new ones get `503`.
    pub max_queued: usize,
    /// Largest accepted request body, in bytes.
    pub max_body_size: usize,
    pub request_timeout_ms: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
            worker_threads: 10,
            max_in_flight: None,
            max_queued: 256,
            max_body_size: 1024 * 1024,
            request_timeout_ms: None,
        }
    }
}

impl ServerConfig {
    /// Loads from `path` (extension optional, file optional) and the environment.
    pub fn load_from(path: &str) -> Result<Self, Error> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("GANTRY").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, Error> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| Error::Address(addr))
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.unwrap_or(self.worker_threads).max(1)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_setup() {
        let config = ServerConfig::default();
        assert_eq!(config.socket_addr().unwrap(), "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.max_in_flight(), 10);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("gantry-config-{}.toml", std::process::id()));
        std::fs::write(&path, "port = 9090\nmax_queued = 4\nrequest_timeout_ms = 250\n").unwrap();

        let config = ServerConfig::load_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.max_queued, 4);
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn bad_host_is_an_address_error() {
        let config = ServerConfig { host: "not a host".into(), ..ServerConfig::default() };
        assert!(matches!(config.socket_addr(), Err(Error::Address(_))));
    }
}
