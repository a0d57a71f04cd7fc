use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::ExporterError;

/// Configuration file structure for the exporter.
///
/// Loaded once at startup; everything in here is read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// GitLab instance settings
    #[serde(default)]
    pub gitlab: GitLabConfig,

    /// Delay between two polls of the same ref, shared by every poller
    #[serde(default = "default_polling_interval_seconds")]
    pub polling_interval_seconds: u64,

    /// Explicitly tracked projects
    #[serde(default)]
    pub projects: Vec<Project>,

    /// Search patterns expanded into projects at startup
    #[serde(default)]
    pub wildcards: Vec<Wildcard>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitLabConfig {
    /// GitLab instance base URL
    #[serde(default = "default_gitlab_url")]
    pub url: String,

    /// GitLab personal access token
    pub token: Option<String>,
}

/// A tracked project and the refs whose pipelines are polled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Full project path (e.g., "group/project")
    pub name: String,
    #[serde(default)]
    pub refs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wildcard {
    /// Search string matched against project names
    #[serde(default)]
    pub search: String,
    pub owner: Owner,
    /// Refs given to every project the wildcard expands into
    #[serde(default)]
    pub refs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub name: String,
    pub kind: OwnerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    User,
    Group,
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            url: default_gitlab_url(),
            token: None,
        }
    }
}

fn default_gitlab_url() -> String {
    "https://gitlab.com".to_string()
}

fn default_polling_interval_seconds() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file.
    ///
    /// The parser is picked from the file extension; files without a known
    /// extension are tried as YAML, then TOML, then JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't open config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Unable to parse YAML config: {}", path.display())),
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Unable to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Unable to parse JSON config: {}", path.display())),
            _ => serde_yaml::from_str(&contents)
                .or_else(|_| toml::from_str(&contents))
                .or_else(|_| serde_json::from_str(&contents))
                .with_context(|| format!("Unable to parse config file: {}", path.display())),
        }
    }

    /// Checks the invariants polling relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the polling interval is zero or if there is
    /// nothing to poll.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.polling_interval_seconds == 0 {
            return Err(ExporterError::Config(
                "polling_interval_seconds must be greater than 0".to_string(),
            ));
        }

        if self.projects.is_empty() && self.wildcards.is_empty() {
            return Err(ExporterError::Config(
                "You need to configure at least one project/wildcard to poll, none given"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_seconds)
    }
}
