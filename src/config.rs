//! Configuration for the agentbay CLI.
//!
//! Settings come from command-line flags, then environment variables, then
//! an optional `config.toml`, in that order of precedence.

use agentbay_sdk::AgentBay;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API key used when none is configured anywhere. Requests made with it are
/// rejected by the service; it only lets the client be constructed.
pub const PLACEHOLDER_API_KEY: &str = "akm-xxx";

/// Root configuration structure matching the config.toml schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_image_id")]
    pub image_id: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            image_id: default_image_id(),
        }
    }
}

fn default_image_id() -> String {
    "code_latest".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// `<config_dir>/agentbay/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("agentbay").join("config.toml"))
    }

    /// Load `explicit` if given (it must exist), else the default path if it
    /// exists, else an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Where the API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Flag,
    Env,
    ConfigFile,
    Placeholder,
}

/// Effective client settings after applying precedence.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    pub api_key_source: ApiKeySource,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub image_id: String,
}

/// Values read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            api_key: non_empty(std::env::var("AGENTBAY_API_KEY").ok()),
            endpoint: non_empty(std::env::var("AGENTBAY_ENDPOINT").ok()),
            timeout_ms: std::env::var("AGENTBAY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Settings {
    pub fn resolve(
        flag_api_key: Option<String>,
        flag_endpoint: Option<String>,
        env: EnvOverrides,
        config: &Config,
    ) -> Self {
        let (api_key, api_key_source) = if let Some(key) = non_empty(flag_api_key) {
            (key, ApiKeySource::Flag)
        } else if let Some(key) = env.api_key {
            (key, ApiKeySource::Env)
        } else if let Some(key) = non_empty(config.api_key.clone()) {
            (key, ApiKeySource::ConfigFile)
        } else {
            (PLACEHOLDER_API_KEY.to_string(), ApiKeySource::Placeholder)
        };

        Self {
            api_key,
            api_key_source,
            endpoint: non_empty(flag_endpoint)
                .or(env.endpoint)
                .or_else(|| non_empty(config.endpoint.clone())),
            timeout_ms: env.timeout_ms.or(config.timeout_ms),
            image_id: config.defaults.image_id.clone(),
        }
    }

    /// Build an SDK client from these settings.
    pub fn client(&self) -> Result<AgentBay> {
        let mut builder = AgentBay::builder().api_key(&self.api_key);
        if let Some(ref endpoint) = self.endpoint {
            builder = builder.endpoint(endpoint);
        }
        if let Some(ms) = self.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        builder.build().context("Error initializing AgentBay client")
    }
}
