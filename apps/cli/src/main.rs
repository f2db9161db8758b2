//! PubNub MCP server: SDK documentation and live-messaging tools for MCP clients.
//!
//! `pubnub-mcp serve` speaks MCP over stdio; the other subcommands run the
//! same tools once from the terminal.

mod commands;
mod mcp;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
