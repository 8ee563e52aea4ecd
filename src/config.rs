//! Server configuration.
//!
//! The configuration is exposed as a global singleton so the server code
//! can reach it anywhere through [`config()`]. It can be loaded from a
//! TOML file with [`ServerConfig::from_file`]; when loading fails the
//! defaults are used.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::OnceLock;

use log::warn;
use serde::Deserialize;

static CONFIG: OnceLock<ServerConfig> = OnceLock::new();

/// All configurable parameters of the server. Deserializable from a TOML
/// file or created with default values; command-line flags override
/// individual fields afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub backlog: i32,

    /// Directory served as the URL root.
    pub root: String,

    pub server_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8000,
            backlog: 128,

            root: ".".to_string(),

            server_name: format!("rustle/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ServerConfig {
    /// Loads the configuration from a TOML file at `path`, falling back to
    /// the defaults when reading or deserialization fails.
    pub fn from_file(path: &str) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                warn!("failed to read {}: {err}; using default config", path);
                return ServerConfig::default();
            }
        };

        match toml::from_str::<ServerConfig>(content.as_str()) {
            Ok(server_config) => server_config,
            Err(err) => {
                warn!("failed to deserialize {}: {err}; using default config", path);
                ServerConfig::default()
            }
        }
    }
}

pub fn set_config(cfg: ServerConfig) {
    CONFIG.set(cfg).expect("Config already set");
}

pub fn config() -> &'static ServerConfig {
    CONFIG.get().expect("Config not initialized")
}
