//! Clients for the two package indexes a run talks to: the origin the
//! releases come from and the destination they are mirrored into.

mod destination;
mod origin;

pub use destination::DevpiIndex;
pub use origin::PypiIndex;

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::http::NonRetryableError;

/// Failures while querying an index for a project.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index does not know the project at all.
    #[error("project {0} not found")]
    NotFound(String),
    /// The index answered, but with a payload we cannot use.
    #[error("invalid index response: {0}")]
    InvalidResponse(String),
    /// The index could not be queried.
    #[error(transparent)]
    Unavailable(#[from] anyhow::Error),
}

impl IndexError {
    /// Maps a project fetch failure. A 404 means the index simply does
    /// not know the project; everything else means the index itself
    /// could not be queried.
    pub(crate) fn from_fetch(name: &str, err: anyhow::Error) -> Self {
        match err.downcast_ref::<NonRetryableError>() {
            Some(NonRetryableError::NotFound(_)) => IndexError::NotFound(name.to_string()),
            _ => IndexError::Unavailable(err),
        }
    }
}

/// How one file hangs off a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRel {
    ReleaseFile,
    Documentation,
    Other(String),
}

impl LinkRel {
    pub fn from_rel(rel: &str) -> Self {
        match rel {
            "releasefile" => LinkRel::ReleaseFile,
            "doczip" => LinkRel::Documentation,
            other => LinkRel::Other(other.to_string()),
        }
    }
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLink {
    pub url: String,
    pub rel: LinkRel,
}

/// Read access to a package index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexClient: Send + Sync {
    /// Lists the versions the index knows for a project.
    async fn list_versions(&self, name: &str) -> Result<Vec<String>, IndexError>;

    /// Lists the files attached to one release of a project.
    async fn release_links(&self, name: &str, version: &str)
    -> Result<Vec<ArtifactLink>, IndexError>;

    /// The index URL, for log and error messages.
    fn index_url(&self) -> &str;
}

/// Write access to an index that accepts release file uploads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Uploads one release file under the given project and version.
    async fn upload(&self, file: &Path, name: &str, version: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_rel_from_rel() {
        assert_eq!(LinkRel::from_rel("releasefile"), LinkRel::ReleaseFile);
        assert_eq!(LinkRel::from_rel("doczip"), LinkRel::Documentation);
        assert_eq!(
            LinkRel::from_rel("toxresult"),
            LinkRel::Other("toxresult".to_string())
        );
    }

    #[test]
    fn test_from_fetch_maps_missing_project() {
        let err = anyhow::Error::from(NonRetryableError::NotFound("gone".to_string()));
        let mapped = IndexError::from_fetch("demo", err);
        assert!(matches!(mapped, IndexError::NotFound(name) if name == "demo"));
    }

    #[test]
    fn test_from_fetch_keeps_other_failures() {
        let err = anyhow::anyhow!("connection refused");
        let mapped = IndexError::from_fetch("demo", err);
        assert!(matches!(mapped, IndexError::Unavailable(_)));
    }

    #[test]
    fn test_from_fetch_auth_failure_is_unavailable() {
        let err = anyhow::Error::from(NonRetryableError::AuthenticationFailed(
            "bad token".to_string(),
        ));
        let mapped = IndexError::from_fetch("demo", err);
        assert!(matches!(mapped, IndexError::Unavailable(_)));
    }
}
