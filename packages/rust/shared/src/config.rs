//! Application configuration for the PubNub MCP server.
//!
//! User config lives at `~/.pubnub-mcp/pubnub-mcp.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PubNubMcpError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "pubnub-mcp.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".pubnub-mcp";

/// Public demo keyset used when no credentials are configured.
pub const DEMO_KEY: &str = "demo";

// ---------------------------------------------------------------------------
// Config structs (matching pubnub-mcp.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Documentation sources.
    #[serde(default)]
    pub docs: DocsConfig,

    /// PubNub account settings.
    #[serde(default)]
    pub pubnub: PubNubConfig,
}

/// `[docs]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// Root of the public documentation site.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory holding the local Markdown resources.
    #[serde(default = "default_resources_dir")]
    pub resources_dir: String,

    /// Subdirectory of `resources_dir` with per-language supplements.
    #[serde(default = "default_languages_subdir")]
    pub languages_subdir: String,

    /// File (inside `resources_dir`) served in place of the remote `functions` reference.
    #[serde(default = "default_functions_file")]
    pub functions_file: String,

    /// HTTP timeout for documentation fetches.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            resources_dir: default_resources_dir(),
            languages_subdir: default_languages_subdir(),
            functions_file: default_functions_file(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.pubnub.com/docs".into()
}
fn default_resources_dir() -> String {
    "resources".into()
}
fn default_languages_subdir() -> String {
    "languages".into()
}
fn default_functions_file() -> String {
    "pubnub_functions.md".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[pubnub]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubNubConfig {
    /// Name of the env var holding the publish key (never store the key itself).
    #[serde(default = "default_publish_key_env")]
    pub publish_key_env: String,

    /// Name of the env var holding the subscribe key.
    #[serde(default = "default_subscribe_key_env")]
    pub subscribe_key_env: String,

    /// REST origin for publish/history/presence calls.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// User id sent with every REST call.
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

impl Default for PubNubConfig {
    fn default() -> Self {
        Self {
            publish_key_env: default_publish_key_env(),
            subscribe_key_env: default_subscribe_key_env(),
            origin: default_origin(),
            user_id: default_user_id(),
        }
    }
}

fn default_publish_key_env() -> String {
    "PUBNUB_PUBLISH_KEY".into()
}
fn default_subscribe_key_env() -> String {
    "PUBNUB_SUBSCRIBE_KEY".into()
}
fn default_origin() -> String {
    "https://ps.pndsn.com".into()
}
fn default_user_id() -> String {
    "pubnub-mcp".into()
}

// ---------------------------------------------------------------------------
// Credentials (runtime, resolved from the environment)
// ---------------------------------------------------------------------------

/// PubNub keyset resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub publish_key: String,
    pub subscribe_key: String,
}

impl Credentials {
    /// Read the keys named by `config`, falling back to the demo keyset.
    pub fn from_env(config: &PubNubConfig) -> Self {
        Self {
            publish_key: env_or_demo(&config.publish_key_env),
            subscribe_key: env_or_demo(&config.subscribe_key_env),
        }
    }

    /// The public demo keyset.
    pub fn demo() -> Self {
        Self {
            publish_key: DEMO_KEY.into(),
            subscribe_key: DEMO_KEY.into(),
        }
    }
}

fn env_or_demo(var_name: &str) -> String {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => val,
        _ => {
            tracing::debug!(var_name, "credential not set, using demo keyset");
            DEMO_KEY.into()
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.pubnub-mcp/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PubNubMcpError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.pubnub-mcp/pubnub-mcp.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PubNubMcpError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PubNubMcpError::config(format!("failed to parse {}: {e}", path.display()))
    })?;

    url::Url::parse(&config.docs.base_url).map_err(|e| {
        PubNubMcpError::config(format!("invalid docs.base_url '{}': {e}", config.docs.base_url))
    })?;

    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PubNubMcpError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PubNubMcpError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PubNubMcpError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
