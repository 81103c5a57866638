use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Sentinels
// =============================================================================

/// Pseudo-version meaning "whatever version is currently newest"
pub const LATEST_VERSION: &str = "latest";

/// Module path placeholder for requests whose module has not been discovered yet
pub const UNKNOWN_MODULE_PATH: &str = "unknownModulePath";

/// Page type tag carried by module pages
pub const PAGE_TYPE_MODULE: &str = "mod";

// =============================================================================
// Network defaults
// =============================================================================

/// Default base URL for the upstream module proxy
pub const DEFAULT_PROXY_URL: &str = "https://proxy.golang.org";

/// Timeout for a single upstream fetch in milliseconds (30 seconds)
pub const FETCH_TIMEOUT_MS: u64 = 30_000;

/// Deadline for a whole request in milliseconds (60 seconds)
pub const REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub source: SourceKind,
    pub proxy: ProxyConfig,
    pub index: IndexConfig,
    pub request: RequestConfig,
    pub logging: LoggingConfig,
}

/// Which data source backs page requests
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Proxy,
    Index,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProxyConfig {
    pub url: String,
    /// Per-fetch timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROXY_URL.to_string(),
            timeout_ms: FETCH_TIMEOUT_MS,
        }
    }
}

impl ProxyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// SQLite database file; defaults to [`db_path`]
    pub path: Option<PathBuf>,
}

impl IndexConfig {
    pub fn db_path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(db_path)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestConfig {
    pub timeout_ms: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: REQUEST_TIMEOUT_MS,
        }
    }
}

impl RequestConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from `<data_dir>/config.json` when
    /// no path is given. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = config_path();
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {}", path.display(), e))?;
        Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

/// Returns the path to the data directory for pkgdoc.
/// Uses $XDG_DATA_HOME/pkgdoc if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/pkgdoc,
/// or ./pkgdoc if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the index database file.
pub fn db_path() -> PathBuf {
    data_dir().join("index.db")
}

/// Returns the directory log files are written to.
pub fn log_dir() -> PathBuf {
    data_dir().join("logs")
}

pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("pkgdoc")
}
