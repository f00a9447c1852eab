//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.fleetwarden.toml` files, including the fleet registry — the static
//! list of managed repositories. The registry is plain injected data, so
//! tests can substitute a fleet of their own.

use crate::models::RepositoryDescriptor;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Version-control host settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Analysis backend settings.
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Result store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// The fleet registry: every repository under management.
    #[serde(default)]
    pub fleet: Vec<RepositoryDescriptor>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8787
}

/// Version-control host API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host API base URL.
    #[serde(default = "default_host_api")]
    pub api_url: String,

    /// Owner/organization that holds the fleet.
    #[serde(default)]
    pub owner: String,

    /// API token. Usually supplied via the FLEETWARDEN_HOST_TOKEN env var.
    #[serde(default)]
    pub token: String,

    /// Request timeout in seconds.
    #[serde(default = "default_host_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            api_url: default_host_api(),
            owner: String::new(),
            token: String::new(),
            timeout_seconds: default_host_timeout(),
        }
    }
}

fn default_host_api() -> String {
    "https://api.github.com".to_string()
}

fn default_host_timeout() -> u64 {
    30
}

/// Settings for all analysis/research backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendsConfig {
    /// Per-request timeout in seconds, bounding every backend call so one
    /// slow service cannot stall the fleet-level join.
    #[serde(default = "default_backend_timeout")]
    pub timeout_seconds: u64,

    /// Bearer credential shared by the backends. Usually supplied via the
    /// FLEETWARDEN_BACKEND_KEY env var.
    #[serde(default)]
    pub api_key: String,

    /// Architecture analysis backend.
    #[serde(default = "BackendConfig::architecture")]
    pub architecture: BackendConfig,

    /// Security analysis backend.
    #[serde(default = "BackendConfig::security")]
    pub security: BackendConfig,

    /// Community trend research backend.
    #[serde(default = "BackendConfig::community")]
    pub community: BackendConfig,

    /// Fleet-wide consolidation synthesis backend.
    #[serde(default = "BackendConfig::synthesis")]
    pub synthesis: BackendConfig,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_backend_timeout(),
            api_key: String::new(),
            architecture: BackendConfig::architecture(),
            security: BackendConfig::security(),
            community: BackendConfig::community(),
            synthesis: BackendConfig::synthesis(),
        }
    }
}

fn default_backend_timeout() -> u64 {
    60
}

/// One analysis backend: an opaque request/response service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Identifier used in logs and error messages.
    pub id: String,

    /// Endpoint URL for prompt submission.
    #[serde(default)]
    pub endpoint: String,

    /// Model or engine name to request.
    #[serde(default)]
    pub model: String,
}

impl BackendConfig {
    fn named(id: &str) -> Self {
        Self {
            id: id.to_string(),
            endpoint: String::new(),
            model: String::new(),
        }
    }

    pub fn architecture() -> Self {
        Self::named("architecture")
    }

    pub fn security() -> Self {
        Self::named("security")
    }

    pub fn community() -> Self {
        Self::named("community")
    }

    pub fn synthesis() -> Self {
        Self::named("synthesis")
    }
}

/// Result store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store endpoint URL. Empty disables persistence.
    #[serde(default)]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_store_timeout")]
    pub timeout_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            timeout_seconds: default_store_timeout(),
        }
    }
}

fn default_store_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".fleetwarden.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ref bind) = args.bind {
            self.server.bind = bind.clone();
        }

        // Credentials from CLI/env win over the config file.
        if let Some(ref token) = args.host_token {
            self.host.token = token.clone();
        }
        if let Some(ref key) = args.backend_key {
            self.backends.api_key = key.clone();
        }

        if let Some(ref owner) = args.owner {
            self.host.owner = owner.clone();
        }

        if let Some(timeout) = args.backend_timeout {
            self.backends.timeout_seconds = timeout;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let mut config = Config::default();
        config.fleet = vec![RepositoryDescriptor {
            name: "example-service".to_string(),
            kind: crate::models::RepoKind::Service,
            primary_language: "Rust".to_string(),
            visibility: "private".to_string(),
        }];
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
