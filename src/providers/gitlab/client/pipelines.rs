use async_trait::async_trait;

use super::core::GitLabClient;
use crate::error::{ExporterError, Result};
use crate::providers::gitlab::api::PipelineQuery;
use crate::providers::gitlab::types::{GitLabPipeline, GitLabProject};

#[async_trait]
impl PipelineQuery for GitLabClient {
    async fn get_project(&self, name: &str) -> Result<GitLabProject> {
        let url = self.project_url(name)?;

        match self.get_json(url).await {
            Err(ExporterError::Api { status: 404, .. }) => {
                Err(ExporterError::ProjectNotFound(name.to_string()))
            }
            other => other,
        }
    }

    async fn list_pipelines(&self, project_id: u64, ref_: &str) -> Result<Vec<GitLabPipeline>> {
        let mut url = self.api_endpoint(&format!("projects/{project_id}/pipelines"))?;
        url.query_pairs_mut().append_pair("ref", ref_);

        self.get_json(url).await
    }

    async fn get_pipeline(&self, project_id: u64, pipeline_id: u64) -> Result<GitLabPipeline> {
        let url = self.api_endpoint(&format!("projects/{project_id}/pipelines/{pipeline_id}"))?;

        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Token;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_get_project_sends_token_and_encodes_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v4/projects/foo(%2F|/)bar(\?.*)?$".to_string()),
            )
            .match_header("private-token", "glpat-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 42, "path_with_namespace": "foo/bar", "name": "bar"}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), Some(Token::from("glpat-test"))).unwrap();
        let project = client.get_project("foo/bar").await.unwrap();

        assert_eq!(project.id, 42);
        assert_eq!(project.path_with_namespace, "foo/bar");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_project_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v4/projects/foo(%2F|/)missing(\?.*)?$".to_string()),
            )
            .with_status(404)
            .with_body(r#"{"message":"404 Project Not Found"}"#)
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let err = client.get_project("foo/missing").await.unwrap_err();

        assert!(matches!(err, ExporterError::ProjectNotFound(ref name) if name == "foo/missing"));
    }

    #[tokio::test]
    async fn test_list_pipelines_filters_by_ref_and_keeps_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v4/projects/42/pipelines(\?.*)?$".to_string()),
            )
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": 101, "status": "running", "ref": "main", "created_at": "2024-05-01T10:00:00.000Z"},
                    {"id": 100, "status": "success", "ref": "main", "created_at": "2024-05-01T09:00:00.000Z"}
                ]"#,
            )
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let pipelines = client.list_pipelines(42, "main").await.unwrap();

        assert_eq!(pipelines.len(), 2);
        assert_eq!(pipelines[0].id, 101);
        assert_eq!(pipelines[0].status, "running");
        assert_eq!(pipelines[0].duration, None);
        assert_eq!(pipelines[1].id, 100);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_pipeline_reads_duration() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v4/projects/42/pipelines/100(\?.*)?$".to_string()),
            )
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": 100, "status": "success", "duration": 42, "created_at": "2024-05-01T09:00:00Z"}"#,
            )
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let pipeline = client.get_pipeline(42, 100).await.unwrap();

        assert_eq!(pipeline.duration, Some(42));
        assert_eq!(pipeline.status, "success");
    }

    #[tokio::test]
    async fn test_server_error_is_returned_as_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                Matcher::Regex(r"^/api/v4/projects/42/pipelines(\?.*)?$".to_string()),
            )
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = GitLabClient::new(&server.url(), None).unwrap();
        let err = client.list_pipelines(42, "main").await.unwrap_err();

        assert!(matches!(err, ExporterError::Api { status: 500, ref message } if message == "boom"));
    }
}
