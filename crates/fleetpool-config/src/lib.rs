pub mod error;

pub use error::*;

use fleetpool_cloud::{Connection, RetryConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at a config file directly
pub const CONFIG_PATH_ENV: &str = "FLEETPOOL_CONFIG_PATH";

pub const REGION_ENV: &str = "FLEETPOOL_REGION";
pub const ENDPOINT_ENV: &str = "FLEETPOOL_ENDPOINT";
pub const CREDENTIALS_ENV: &str = "FLEETPOOL_CREDENTIALS";

const DEFAULT_REGION: &str = "us-east-1";
const CANDIDATES: [&str; 2] = ["fleetpool.local.yaml", "fleetpool.yaml"];

/// FleetPool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub region: String,

    /// Endpoint URL override
    pub endpoint: Option<String>,

    /// Named credentials (AWS shared-config profile)
    pub credentials_ref: Option<String>,

    pub retry: RetrySettings,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            credentials_ref: None,
            retry: RetrySettings::default(),
        }
    }
}

/// Transport retry policy, applied by the remote client before an error surfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
        }
    }
}

impl PoolConfig {
    /// Overlay FLEETPOOL_REGION / FLEETPOOL_ENDPOINT / FLEETPOOL_CREDENTIALS
    pub fn apply_env(mut self) -> Self {
        if let Some(region) = non_empty_env(REGION_ENV) {
            self.region = region;
        }
        if let Some(endpoint) = non_empty_env(ENDPOINT_ENV) {
            self.endpoint = Some(endpoint);
        }
        if let Some(credentials) = non_empty_env(CREDENTIALS_ENV) {
            self.credentials_ref = Some(credentials);
        }
        self
    }

    pub fn connection(&self) -> Connection {
        Connection {
            credentials_ref: self.credentials_ref.clone(),
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        }
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.retry.initial_backoff_ms),
            max_delay: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// グローバル設定ファイルのパス (~/.config/fleetpool/fleetpool.yaml)
fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or(ConfigError::ConfigDirNotFound)?;
    Ok(config_dir.join("fleetpool").join("fleetpool.yaml"))
}

/// FleetPoolの設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 FLEETPOOL_CONFIG_PATH (直接パス指定)
/// 2. カレントディレクトリ: fleetpool.local.yaml, fleetpool.yaml
/// 3. ~/.config/fleetpool/fleetpool.yaml (グローバル設定)
pub fn find_config_file() -> Result<PathBuf> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "FLEETPOOL_CONFIG_PATH is set but file does not exist");
    }

    // 2. カレントディレクトリで検索
    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    // 3. グローバル設定
    if let Ok(global_config) = global_config_path() {
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Parse one config file
pub fn load_config_from(path: &Path) -> Result<PoolConfig> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(PoolConfig::default());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Load the discovered config file, or defaults when there is none
pub fn load_config() -> Result<PoolConfig> {
    match find_config_file() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            load_config_from(&path)
        }
        Err(ConfigError::ConfigFileNotFound) => {
            tracing::debug!("No config file found, using defaults");
            Ok(PoolConfig::default())
        }
        Err(e) => Err(e),
    }
}
