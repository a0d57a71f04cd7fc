use async_trait::async_trait;
use log::debug;

use super::core::{GitLabClient, PAGE_SIZE};
use crate::error::Result;
use crate::providers::gitlab::api::ProjectListing;
use crate::providers::gitlab::types::GitLabProject;

impl GitLabClient {
    /// List the non-archived projects of a user or group namespace,
    /// following pagination until GitLab stops sending `X-Next-Page`.
    async fn list_namespace_projects(
        &self,
        scope: &str,
        owner: &str,
        search: &str,
    ) -> Result<Vec<GitLabProject>> {
        let mut all_projects = Vec::new();
        let mut page = Some(1);

        while let Some(current) = page {
            let mut url =
                self.api_endpoint(&format!("{scope}/{}/projects", urlencoding::encode(owner)))?;
            url.query_pairs_mut()
                .append_pair("archived", "false")
                .append_pair("simple", "true")
                .append_pair("search", search)
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &current.to_string());

            let (projects, next_page): (Vec<GitLabProject>, Option<u32>) =
                self.get_page(url).await?;

            debug!(
                "Fetched page {current} of {scope} '{owner}' projects ({} entries)",
                projects.len()
            );

            all_projects.extend(projects);
            page = next_page;
        }

        Ok(all_projects)
    }
}

#[async_trait]
impl ProjectListing for GitLabClient {
    async fn list_user_projects(&self, user: &str, search: &str) -> Result<Vec<GitLabProject>> {
        self.list_namespace_projects("users", user, search).await
    }

    async fn list_group_projects(&self, group: &str, search: &str) -> Result<Vec<GitLabProject>> {
        self.list_namespace_projects("groups", group, search).await
    }
}
