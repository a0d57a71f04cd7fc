use async_trait::async_trait;

use crate::error::Result;

use super::types::{GitLabPipeline, GitLabProject};

/// Pipeline queries issued by the ref pollers.
#[async_trait]
pub trait PipelineQuery: Send + Sync {
    /// Look a project up by its full path.
    async fn get_project(&self, name: &str) -> Result<GitLabProject>;

    /// Pipelines of `ref_`, newest first, in the order GitLab returns them.
    async fn list_pipelines(&self, project_id: u64, ref_: &str) -> Result<Vec<GitLabPipeline>>;

    /// Full pipeline record, including its duration.
    async fn get_pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<GitLabPipeline>;
}

/// Project listings used to expand wildcards.
///
/// Both calls return only non-archived projects matching `search`.
#[async_trait]
pub trait ProjectListing: Send + Sync {
    async fn list_user_projects(&self, user: &str, search: &str) -> Result<Vec<GitLabProject>>;

    async fn list_group_projects(&self, group: &str, search: &str) -> Result<Vec<GitLabProject>>;
}
