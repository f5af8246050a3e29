//! Client configuration and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.unichain/config.json`) and environment.
//! The base address is derived from the network when no override is given.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ClientError;

pub const MAINNET_BASE_URL: &str = "https://api.unichain.org";
pub const TESTNET_BASE_URL: &str = "https://testnet-api.unichain.org";
pub const LOCAL_BASE_URL: &str = "http://localhost:8080";

/// Path of the live-update endpoint, appended to the upgraded base address.
pub const WS_PATH: &str = "/v1/ws";

/// Network the client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    /// Node running on the loopback interface.
    Local,
}

impl Network {
    /// Fixed base address for this network.
    pub fn base_url(self) -> &'static str {
        match self {
            Network::Mainnet => MAINNET_BASE_URL,
            Network::Testnet => TESTNET_BASE_URL,
            Network::Local => LOCAL_BASE_URL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Local => "local",
        }
    }
}

impl std::str::FromStr for Network {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "local" => Ok(Network::Local),
            other => Err(ClientError::Config(format!("unknown network: {}", other))),
        }
    }
}

/// Client settings: credential, network, base address override and request timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Bearer credential. Overridden by UNICHAIN_API_KEY env when loaded from file.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub network: Network,

    /// Explicit base address. When absent, taken from the network table.
    #[serde(default)]
    pub base_url: Option<String>,

    /// HTTP request timeout in milliseconds (default 30000).
    #[serde(default = "default_timeout_ms", rename = "timeout")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            network: Network::default(),
            base_url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Base address: the override (without trailing slash) or the network's table entry.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| self.network.base_url().to_string())
    }

    /// Credential, if configured and non-empty.
    pub fn bearer_token(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Live-update address: base address with the scheme upgraded (http→ws, https→wss) plus `/v1/ws`.
    pub fn ws_url(&self) -> Result<String, ClientError> {
        let base = self.resolved_base_url();
        let upgraded = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else if base.starts_with("wss://") || base.starts_with("ws://") {
            base
        } else {
            return Err(ClientError::Config(format!(
                "base url must start with http:// or https://: {}",
                base
            )));
        };
        Ok(format!("{}{}", upgraded, WS_PATH))
    }

    /// Copy of this config with `base_url` filled in from the network table.
    pub fn resolved(&self) -> Self {
        Self {
            base_url: Some(self.resolved_base_url()),
            ..self.clone()
        }
    }
}

/// Resolve the API key: env UNICHAIN_API_KEY overrides config.
pub fn resolve_api_key(config: &ClientConfig) -> Option<String> {
    std::env::var("UNICHAIN_API_KEY")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| config.bearer_token().map(str::to_string))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("UNICHAIN_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".unichain").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default path). Missing file => default config.
/// The API key is then overridden from the environment when UNICHAIN_API_KEY is set.
pub fn load_config(path: Option<PathBuf>) -> Result<(ClientConfig, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        ClientConfig::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    config.api_key = resolve_api_key(&config);
    Ok((config, path))
}
