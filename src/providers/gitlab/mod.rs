mod api;
mod client;
mod types;

pub use api::{PipelineQuery, ProjectListing};
pub use client::GitLabClient;
pub use types::{GitLabPipeline, GitLabProject};
