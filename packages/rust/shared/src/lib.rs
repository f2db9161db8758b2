//! Shared types, error model, and configuration for the PubNub MCP server.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`PubNubMcpError`] — the unified error type
//! - Fixed request enumerations ([`SdkLanguage`], [`ApiTopic`], [`AppType`])
//! - Configuration ([`AppConfig`], [`DocsConfig`], [`Credentials`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, Credentials, DEMO_KEY, DocsConfig, PubNubConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{PubNubMcpError, Result};
pub use types::{ApiTopic, AppType, EnumParseError, SdkLanguage};
