use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{ExporterError, Result};
use crate::providers::gitlab::{GitLabPipeline, GitLabProject, PipelineQuery};

/// Pipeline created at a fixed instant in the past.
pub fn pipeline(id: u64, status: &str, duration: Option<u64>) -> GitLabPipeline {
    GitLabPipeline {
        id,
        status: status.to_string(),
        duration,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    }
}

/// In-memory GitLab whose answers tests rewrite between cycles.
#[derive(Default)]
pub struct FakePipelines {
    projects: HashMap<String, u64>,
    // None makes the listing fail
    lists: Mutex<HashMap<(u64, String), Option<Vec<GitLabPipeline>>>>,
    details: Mutex<HashMap<u64, GitLabPipeline>>,
    detail_calls: AtomicUsize,
}

impl FakePipelines {
    pub fn with_project(name: &str, id: u64) -> Self {
        let mut fake = Self::default();
        fake.projects.insert(name.to_string(), id);
        fake
    }

    pub fn add_project(&mut self, name: &str, id: u64) {
        self.projects.insert(name.to_string(), id);
    }

    /// Replace the listing of a ref; every entry also becomes its own detail.
    pub fn set_pipelines(&self, project_id: u64, ref_: &str, pipelines: Vec<GitLabPipeline>) {
        let mut details = self.details.lock().unwrap();
        for pipeline in &pipelines {
            details.insert(pipeline.id, pipeline.clone());
        }
        self.lists
            .lock()
            .unwrap()
            .insert((project_id, ref_.to_string()), Some(pipelines));
    }

    pub fn fail_pipelines(&self, project_id: u64, ref_: &str) {
        self.lists
            .lock()
            .unwrap()
            .insert((project_id, ref_.to_string()), None);
    }

    pub fn set_detail(&self, pipeline: GitLabPipeline) {
        self.details.lock().unwrap().insert(pipeline.id, pipeline);
    }

    pub fn remove_detail(&self, pipeline_id: u64) {
        self.details.lock().unwrap().remove(&pipeline_id);
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PipelineQuery for FakePipelines {
    async fn get_project(&self, name: &str) -> Result<GitLabProject> {
        self.projects
            .get(name)
            .map(|id| GitLabProject {
                id: *id,
                path_with_namespace: name.to_string(),
            })
            .ok_or_else(|| ExporterError::ProjectNotFound(name.to_string()))
    }

    async fn list_pipelines(&self, project_id: u64, ref_: &str) -> Result<Vec<GitLabPipeline>> {
        match self
            .lists
            .lock()
            .unwrap()
            .get(&(project_id, ref_.to_string()))
        {
            Some(Some(pipelines)) => Ok(pipelines.clone()),
            Some(None) => Err(ExporterError::Api {
                status: 502,
                message: "Bad Gateway".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn get_pipeline(&self, _project_id: u64, pipeline_id: u64) -> Result<GitLabPipeline> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .lock()
            .unwrap()
            .get(&pipeline_id)
            .cloned()
            .ok_or_else(|| ExporterError::Api {
                status: 404,
                message: "404 Not found".to_string(),
            })
    }
}
