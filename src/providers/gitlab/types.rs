use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A GitLab project as returned by the `simple=true` project endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitLabProject {
    /// Numeric project id
    pub id: u64,
    /// Full path (e.g., "group/project")
    pub path_with_namespace: String,
}

/// A GitLab CI/CD pipeline run.
///
/// The list endpoint leaves `duration` out, only the single pipeline
/// endpoint fills it in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GitLabPipeline {
    pub id: u64,
    /// Raw status string (e.g., "success", "failed", "running", "canceled")
    pub status: String,
    /// Duration in seconds, null while the pipeline is still running
    #[serde(default)]
    pub duration: Option<u64>,
    pub created_at: DateTime<Utc>,
}
