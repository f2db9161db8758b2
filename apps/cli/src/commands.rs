//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use tracing::{info, warn};
use url::Url;

use pubnub_mcp_core::tools::READ_SDK_DOCS;
use pubnub_mcp_core::{Dispatcher, ToolCall};
use pubnub_mcp_docs::{
    Aggregator, ReqwestFetcher, ResourceCatalog, SourceResolver, snapshot_articles,
};
use pubnub_mcp_messaging::PubNubClient;
use pubnub_mcp_shared::{AppConfig, Credentials, init_config, load_config};

use crate::mcp;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PubNub MCP server: SDK docs and messaging tools for AI assistants.
#[derive(Parser)]
#[command(
    name = "pubnub-mcp",
    version,
    about = "Serve PubNub SDK documentation and live-messaging tools over MCP.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Local resources directory (overrides `docs.resources_dir`).
    #[arg(long, global = true, env = "PUBNUB_MCP_RESOURCES_DIR")]
    pub resources_dir: Option<PathBuf>,

    /// Documentation site root (overrides `docs.base_url`).
    #[arg(long, global = true, env = "PUBNUB_MCP_DOCS_BASE_URL")]
    pub docs_base_url: Option<Url>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the MCP server on stdin/stdout.
    Serve,

    /// Print aggregated SDK documentation for one language.
    Docs {
        /// SDK language (e.g. javascript, python, c-sharp).
        language: String,

        /// API reference section.
        #[arg(short, long, default_value = "configuration")]
        topic: String,
    },

    /// List the identifiers of the local resource documents.
    Resources,

    /// Capture documentation articles into a single Markdown file.
    Snapshot {
        /// Output file.
        #[arg(short, long)]
        out: PathBuf,

        /// Article URLs, in output order.
        #[arg(required = true)]
        urls: Vec<Url>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs always go to stderr: stdout carries MCP frames or command output.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "pubnub_mcp=info",
        1 => "pubnub_mcp=debug",
        _ => "pubnub_mcp=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.resources_dir.as_deref(), cli.docs_base_url.as_ref())?;

    match cli.command {
        Command::Serve => cmd_serve(&config).await,
        Command::Docs { language, topic } => cmd_docs(&config, &language, &topic).await,
        Command::Resources => cmd_resources(&config),
        Command::Snapshot { out, urls } => cmd_snapshot(&config, &out, &urls).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the config file and apply command-line overrides.
fn resolve_config(resources_dir: Option<&Path>, docs_base_url: Option<&Url>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(dir) = resources_dir {
        config.docs.resources_dir = dir.to_string_lossy().to_string();
    }
    if let Some(url) = docs_base_url {
        config.docs.base_url = url.to_string();
    }
    Ok(config)
}

/// Wire the catalog, resolver, aggregator and messaging client together.
pub(crate) fn build_dispatcher(
    config: &AppConfig,
) -> Result<Dispatcher<ReqwestFetcher, PubNubClient>> {
    let credentials = Credentials::from_env(&config.pubnub);
    let catalog = ResourceCatalog::build(&config.docs.resources_dir, &config.docs.languages_subdir);
    let resolver = SourceResolver::new(&config.docs)?;
    let fetcher = ReqwestFetcher::new(config.docs.timeout_secs)?;
    let aggregator = Aggregator::new(fetcher, &credentials);
    let messaging = PubNubClient::new(&config.pubnub, credentials, config.docs.timeout_secs)?;

    Ok(Dispatcher::new(catalog, resolver, aggregator, messaging))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config: &AppConfig) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;
    info!(
        resources = dispatcher.catalog().len(),
        docs = %config.docs.base_url,
        "MCP server listening on stdio"
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    mcp::serve(&dispatcher, stdin, tokio::io::stdout()).await
}

async fn cmd_docs(config: &AppConfig, language: &str, topic: &str) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;
    let call = ToolCall::new(READ_SDK_DOCS, json!({ "language": language, "apiReference": topic }));

    let spinner = spinner(format!("Fetching {language} / {topic} documentation"))?;
    let response = dispatcher.dispatch(&call).await;
    spinner.finish_and_clear();

    if response.is_error {
        return Err(eyre!(response.joined_text()));
    }
    println!("{}", response.joined_text());
    Ok(())
}

fn cmd_resources(config: &AppConfig) -> Result<()> {
    let catalog = ResourceCatalog::build(&config.docs.resources_dir, &config.docs.languages_subdir);
    if catalog.is_empty() {
        warn!(dir = %config.docs.resources_dir, "no resource documents found");
    }
    for id in catalog.ids() {
        println!("{id}");
    }
    Ok(())
}

async fn cmd_snapshot(config: &AppConfig, out: &Path, urls: &[Url]) -> Result<()> {
    let fetcher = ReqwestFetcher::new(config.docs.timeout_secs)?;

    let spinner = spinner(format!("Capturing {} article(s)", urls.len()))?;
    let result = snapshot_articles(&fetcher, urls).await;
    spinner.finish_and_clear();

    for (url, reason) in &result.failed {
        warn!(%url, %reason, "article skipped");
    }
    if result.fetched.is_empty() {
        return Err(eyre!("no articles could be captured; {} not written", out.display()));
    }

    let mut markdown = result.markdown;
    markdown.push('\n');
    tokio::fs::write(out, markdown)
        .await
        .map_err(|e| eyre!("failed to write {}: {e}", out.display()))?;

    println!();
    println!("  Snapshot written!");
    println!("  File:    {}", out.display());
    println!("  Fetched: {}", result.fetched.len());
    println!("  Skipped: {}", result.failed.len());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

/// Spinner on stderr for long network operations.
fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}
