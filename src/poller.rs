use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::metrics::{MetricStore, TRACKED_STATUSES};
use crate::providers::gitlab::{GitLabPipeline, PipelineQuery};

/// What a single polling cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// Listing failed; nothing but staleness was touched.
    QueryFailed,
    /// GitLab has no pipeline for this ref.
    NoPipelines,
    /// Newest pipeline has the same id and status as the snapshot.
    Unchanged,
    /// A change was seen but the pipeline detail could not be fetched.
    DetailFailed,
    /// Snapshot replaced and metrics written.
    Updated,
}

/// Polls the pipelines of a single `(project, ref)` pair forever.
///
/// The last observed pipeline lives only here; the shared metric store is
/// the sole thing written from this task.
pub struct RefPoller {
    api: Arc<dyn PipelineQuery>,
    metrics: Arc<MetricStore>,
    project: String,
    ref_: String,
    project_id: u64,
    interval: Duration,
    last_pipeline: Option<GitLabPipeline>,
}

impl RefPoller {
    /// Resolve the project and build a poller for one of its refs.
    ///
    /// # Errors
    ///
    /// Returns an error if the project cannot be looked up. Callers treat
    /// this as a misconfiguration and stop the exporter.
    pub async fn start(
        api: Arc<dyn PipelineQuery>,
        metrics: Arc<MetricStore>,
        project: &str,
        ref_: &str,
        interval: Duration,
    ) -> Result<Self> {
        let remote = api.get_project(project).await?;
        info!("--> Polling ID: {} | {}:{}", remote.id, project, ref_);

        Ok(Self {
            api,
            metrics,
            project: project.to_string(),
            ref_: ref_.to_string(),
            project_id: remote.id,
            interval,
            last_pipeline: None,
        })
    }

    #[cfg(test)]
    pub fn last_pipeline(&self) -> Option<&GitLabPipeline> {
        self.last_pipeline.as_ref()
    }

    /// Poll, then sleep for the polling interval, until the process exits.
    pub async fn run(mut self) {
        loop {
            let cycle = self.poll_once().await;
            debug!("{}:{} cycle finished: {cycle:?}", self.project, self.ref_);

            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run one polling cycle.
    ///
    /// Query errors are swallowed here: the next cycle is the retry. A cycle
    /// where GitLab lists no pipeline leaves every series untouched,
    /// staleness included.
    pub async fn poll_once(&mut self) -> Cycle {
        let listing = self.api.list_pipelines(self.project_id, &self.ref_).await;

        let cycle = match listing {
            Ok(pipelines) => self.sync(pipelines.first()).await,
            Err(e) => {
                warn!(
                    "Unable to list pipelines for {}:{} : {e}",
                    self.project, self.ref_
                );
                Cycle::QueryFailed
            }
        };

        if cycle != Cycle::NoPipelines {
            self.update_staleness(Utc::now());
        }

        cycle
    }

    /// Compare the newest listed pipeline with the snapshot and, on change,
    /// write the new state.
    ///
    /// `run_count` is only bumped once the pipeline detail has been fetched,
    /// so if the newest pipeline changes again while detail fetches keep
    /// failing, those transitions are counted as one.
    async fn sync(&mut self, newest: Option<&GitLabPipeline>) -> Cycle {
        let Some(newest) = newest else {
            if self.last_pipeline.is_none() {
                info!("Could not find any pipeline for {}:{}", self.project, self.ref_);
            } else {
                debug!(
                    "GitLab returned no pipeline for {}:{}, keeping last snapshot",
                    self.project, self.ref_
                );
            }
            return Cycle::NoPipelines;
        };

        if !self.has_changed(newest) {
            return Cycle::Unchanged;
        }

        // The list endpoint does not carry the duration
        let detail = self.api.get_pipeline(self.project_id, newest.id).await;
        let pipeline = match detail {
            Ok(pipeline) => pipeline,
            Err(e) => {
                warn!(
                    "Unable to fetch pipeline {} for {}:{} : {e}",
                    newest.id, self.project, self.ref_
                );
                return Cycle::DetailFailed;
            }
        };

        if self.last_pipeline.is_some() {
            self.metrics.inc_run_count(&self.project, &self.ref_);
        }

        #[allow(clippy::cast_precision_loss)]
        let duration = pipeline.duration.unwrap_or_default() as f64;
        self.metrics
            .set_last_run_duration(&self.project, &self.ref_, duration);

        for status in TRACKED_STATUSES {
            let value = if status == pipeline.status { 1.0 } else { 0.0 };
            self.metrics
                .set_status(&self.project, &self.ref_, status, value);
        }

        self.last_pipeline = Some(pipeline);

        Cycle::Updated
    }

    fn has_changed(&self, newest: &GitLabPipeline) -> bool {
        self.last_pipeline
            .as_ref()
            .map_or(true, |last| last.id != newest.id || last.status != newest.status)
    }

    fn update_staleness(&self, now: DateTime<Utc>) {
        if let Some(pipeline) = &self.last_pipeline {
            self.metrics.set_time_since_last_run(
                &self.project,
                &self.ref_,
                elapsed_seconds(pipeline.created_at, now),
            );
        }
    }
}

/// Whole seconds between `since` and `now`, rounded half away from zero.
#[allow(clippy::cast_precision_loss)]
fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    ((now - since).num_milliseconds() as f64 / 1000.0).round()
}
