use futures::future::try_join_all;
use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Project;
use crate::error::Result;
use crate::metrics::MetricStore;
use crate::poller::RefPoller;
use crate::providers::gitlab::PipelineQuery;

/// Handle on the launched pollers.
///
/// Only counts them: pollers are never supervised, restarted or stopped.
pub struct Fleet {
    launched: usize,
    active: Arc<AtomicUsize>,
}

impl Fleet {
    /// Start one poller per `(project, ref)` pair and return right away.
    ///
    /// All project lookups happen before any poller is spawned, so a
    /// lookup failure leaves nothing running.
    ///
    /// # Errors
    ///
    /// Returns the first project lookup error.
    pub async fn launch(
        api: Arc<dyn PipelineQuery>,
        metrics: Arc<MetricStore>,
        projects: &[Project],
        interval: Duration,
    ) -> Result<Self> {
        info!(
            "-> {} project(s) configured with a total of {} ref(s)",
            projects.len(),
            total_refs(projects)
        );

        let starts = projects
            .iter()
            .flat_map(|project| project.refs.iter().map(move |ref_| (project, ref_)))
            .map(|(project, ref_)| {
                RefPoller::start(
                    Arc::clone(&api),
                    Arc::clone(&metrics),
                    &project.name,
                    ref_,
                    interval,
                )
            });

        let pollers = try_join_all(starts).await?;

        let active = Arc::new(AtomicUsize::new(0));
        let launched = pollers.len();

        for poller in pollers {
            let guard = ActiveGuard::new(Arc::clone(&active));
            tokio::spawn(async move {
                let _guard = guard;
                poller.run().await;
            });
        }

        Ok(Self { launched, active })
    }

    #[cfg(test)]
    pub(crate) fn with_counts(launched: usize, active: usize) -> Self {
        Self {
            launched,
            active: Arc::new(AtomicUsize::new(active)),
        }
    }

    pub fn launched(&self) -> usize {
        self.launched
    }

    /// Pollers whose task has not ended (normally or by panicking).
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

pub fn total_refs(projects: &[Project]) -> usize {
    projects.iter().map(|project| project.refs.len()).sum()
}

/// Counts a poller task as active for as long as it is alive.
struct ActiveGuard(Arc<AtomicUsize>);

impl ActiveGuard {
    fn new(active: Arc<AtomicUsize>) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self(active)
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
