use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::Token;
use crate::config::Config;
use crate::fleet::Fleet;
use crate::metrics::MetricStore;
use crate::providers::gitlab::{GitLabClient, PipelineQuery};
use crate::resolver::resolve_wildcards;
use crate::server::{self, AppState};

#[derive(Parser)]
#[command(name = "ci-pipelines-exporter")]
#[command(author, version, about = "GitLab CI pipelines Prometheus exporter", long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "/etc/config.yml")]
    config: PathBuf,

    /// Listening address
    #[arg(short, long, default_value = ":8080")]
    listen_address: String,

    /// GitLab token, takes precedence over the one in the config file
    #[arg(short, long, env = "GITLAB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(&self.config)?;
        config.validate()?;

        info!("-> Starting exporter");
        info!(
            "-> Polling {} every {}s",
            config.gitlab.url, config.polling_interval_seconds
        );

        let token = self
            .token
            .as_deref()
            .or(config.gitlab.token.as_deref())
            .map(Token::from);

        let client = Arc::new(GitLabClient::new(&config.gitlab.url, token)?);

        let mut projects = config.projects.clone();
        projects.extend(
            resolve_wildcards(client.as_ref(), &config.wildcards)
                .await
                .context("Unable to list projects from the GitLab API")?,
        );

        let metrics = Arc::new(MetricStore::new()?);
        let api: Arc<dyn PipelineQuery> = client.clone();

        let fleet = Fleet::launch(
            api,
            Arc::clone(&metrics),
            &projects,
            config.polling_interval(),
        )
        .await
        .context("Unable to fetch project from the GitLab API")?;

        let state = AppState {
            metrics,
            fleet: Arc::new(fleet),
            client,
        };

        server::serve(&self.listen_address, state).await
    }
}
