use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::auth::Token;
use crate::error::{ExporterError, Result};

pub(super) const PAGE_SIZE: usize = 100;
const READINESS_TIMEOUT_SECONDS: u64 = 5;

/// Thin GitLab REST API v4 client.
///
/// Every call is a single attempt: failures are returned to the caller,
/// which decides whether they are fatal.
pub struct GitLabClient {
    client: Client,
    base_url: Url,
    api_url: Url,
    token: Option<Token>,
}

impl GitLabClient {
    pub fn new(base_url: &str, token: Option<Token>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ci-pipelines-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExporterError::Config(format!("Failed to create HTTP client: {e}")))?;

        // Url::join drops the last path segment unless it ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_owned()
        } else {
            format!("{base_url}/")
        };

        let base_url = Url::parse(&normalized)
            .map_err(|e| ExporterError::Config(format!("Invalid base URL: {e}")))?;

        let api_url = base_url
            .join("api/v4/")
            .map_err(|e| ExporterError::Config(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_url,
            token,
        })
    }

    pub fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.token {
            request.header("PRIVATE-TOKEN", token.as_str())
        } else {
            request
        }
    }

    /// Resolve a path relative to `/api/v4/`.
    pub(super) fn api_endpoint(&self, path: &str) -> Result<Url> {
        self.api_url
            .join(path)
            .map_err(|e| ExporterError::Config(format!("Invalid API URL '{path}': {e}")))
    }

    /// Construct project base URL from either a numeric id or a full path
    pub(super) fn project_url(&self, project: &str) -> Result<Url> {
        self.api_endpoint(&format!("projects/{}", urlencoding::encode(project)))
    }

    pub(super) async fn get_json<T>(&self, url: Url) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_page(url).await.map(|(body, _)| body)
    }

    /// GET a JSON resource and return it together with the `X-Next-Page`
    /// header, which GitLab leaves empty on the last page.
    pub(super) async fn get_page<T>(&self, url: Url) -> Result<(T, Option<u32>)>
    where
        T: DeserializeOwned,
    {
        debug!("GET {url}");

        let response = self.auth_request(self.client.get(url)).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(ExporterError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let next_page = response
            .headers()
            .get("x-next-page")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());

        let body = response.json().await?;

        Ok((body, next_page))
    }

    /// Readiness probe: the sign-in page answers within a few seconds.
    pub async fn is_reachable(&self) -> bool {
        let Ok(url) = self.base_url.join("users/sign_in") else {
            return false;
        };

        match self
            .client
            .get(url)
            .timeout(Duration::from_secs(READINESS_TIMEOUT_SECONDS))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("GitLab readiness check failed: {e}");
                false
            }
        }
    }
}
