//! Resolves a request against the origin into a concrete release to move.

use log::debug;

use crate::index::{ArtifactLink, IndexClient, IndexError, LinkRel};
use crate::request::PackageRequest;
use crate::version::select_best;

/// A release picked for transfer: the version and its release files.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub version: String,
    pub links: Vec<ArtifactLink>,
}

/// Picks the best version `index` has for the request and collects that
/// release's files, keeping only actual release files.
///
/// `Ok(None)` means the index cannot satisfy the request, either because
/// it does not know the project or because no listed version matches.
pub async fn resolve(
    request: &PackageRequest,
    index: &dyn IndexClient,
) -> Result<Option<Resolution>, IndexError> {
    let versions = match index.list_versions(&request.name).await {
        Ok(versions) => versions,
        Err(IndexError::NotFound(_)) => return Ok(None),
        Err(err) => return Err(err),
    };

    let Some(version) = select_best(&request.specifiers, versions.iter().map(String::as_str))
    else {
        return Ok(None);
    };
    let version = version.to_string();

    let links: Vec<ArtifactLink> = index
        .release_links(&request.name, &version)
        .await?
        .into_iter()
        .filter(|link| link.rel == LinkRel::ReleaseFile)
        .collect();

    debug!(
        "Resolved {} to {} with {} release files",
        request.name,
        version,
        links.len()
    );

    Ok(Some(Resolution { version, links }))
}
