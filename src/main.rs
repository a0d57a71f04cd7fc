mod auth;
mod cli;
mod config;
mod error;
mod fleet;
mod metrics;
mod poller;
mod providers;
mod resolver;
mod server;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    cli.execute().await?;

    Ok(())
}
