use log::info;

use crate::config::{OwnerKind, Project, Wildcard};
use crate::error::Result;
use crate::providers::gitlab::ProjectListing;

/// Expand wildcards into concrete projects.
///
/// Every remote project matched by a wildcard inherits the wildcard's refs
/// verbatim. Results keep wildcard order, then listing order. Projects
/// reachable through several wildcards are returned once per wildcard.
///
/// # Errors
///
/// The first listing failure aborts the whole expansion: the tracked set
/// cannot be trusted if one wildcard could not be resolved.
pub async fn resolve_wildcards<L>(listing: &L, wildcards: &[Wildcard]) -> Result<Vec<Project>>
where
    L: ProjectListing + ?Sized,
{
    let mut projects = Vec::new();

    for wildcard in wildcards {
        info!(
            "-> Listing all projects using search pattern : '{}' with owner '{}' ({})",
            wildcard.search, wildcard.owner.name, wildcard.owner.kind
        );

        let found = match wildcard.owner.kind {
            OwnerKind::User => {
                listing
                    .list_user_projects(&wildcard.owner.name, &wildcard.search)
                    .await?
            }
            OwnerKind::Group => {
                listing
                    .list_group_projects(&wildcard.owner.name, &wildcard.search)
                    .await?
            }
        };

        for remote in found {
            info!("-> Found project : {}", remote.path_with_namespace);
            projects.push(Project {
                name: remote.path_with_namespace,
                refs: wildcard.refs.clone(),
            });
        }
    }

    Ok(projects)
}
