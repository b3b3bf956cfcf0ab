//! Client for the origin index, speaking the PyPI JSON API.

use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::http::{check_retryable, with_retry};

use super::{ArtifactLink, IndexClient, IndexError, LinkRel};

/// Project document returned by `{index}/{project}/json`.
/// Every file listed under a release is a release file; the JSON API
/// does not carry documentation archives.
#[derive(Debug, Deserialize)]
struct ProjectDocument {
    releases: BTreeMap<String, Vec<ReleaseFileEntry>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFileEntry {
    url: String,
}

/// Read-only client for a PyPI-compatible origin index.
pub struct PypiIndex {
    client: Client,
    index_url: String,
    credentials: Option<(String, String)>,
}

impl PypiIndex {
    #[tracing::instrument(skip(client, credentials))]
    pub fn new(
        client: Client,
        base_url: &str,
        index_name: &str,
        credentials: Option<(String, String)>,
    ) -> Self {
        let index_url = format!("{}/{}", base_url.trim_end_matches('/'), index_name);
        Self {
            client,
            index_url,
            credentials,
        }
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_project(&self, name: &str) -> Result<ProjectDocument, IndexError> {
        let url = format!("{}/{}/json", self.index_url, name);

        debug!("Fetching project document from {}...", url);

        let body = with_retry("Fetching origin project", || {
            let client = self.client.clone();
            let url = url.clone();
            let credentials = self.credentials.clone();
            async move {
                let mut request = client.get(&url).header(ACCEPT, "application/json");
                if let Some((user, password)) = &credentials {
                    request = request.basic_auth(user, Some(password));
                }

                let response = request
                    .send()
                    .await
                    .context("Failed to send request to the origin index")?;

                let response = response.error_for_status().map_err(check_retryable)?;

                let body = response
                    .text()
                    .await
                    .context("Failed to read origin index response")?;

                Ok(body)
            }
        })
        .await
        .map_err(|err| IndexError::from_fetch(name, err))?;

        serde_json::from_str(&body).map_err(|err| {
            IndexError::InvalidResponse(format!("project document for {}: {}", name, err))
        })
    }
}

#[async_trait]
impl IndexClient for PypiIndex {
    #[tracing::instrument(skip(self))]
    async fn list_versions(&self, name: &str) -> Result<Vec<String>, IndexError> {
        let document = self.fetch_project(name).await?;
        Ok(document.releases.into_keys().collect())
    }

    #[tracing::instrument(skip(self))]
    async fn release_links(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Vec<ArtifactLink>, IndexError> {
        let document = self.fetch_project(name).await?;
        let Some(files) = document.releases.get(version) else {
            return Err(IndexError::InvalidResponse(format!(
                "project {} lists no release {}",
                name, version
            )));
        };

        Ok(files
            .iter()
            .map(|file| ArtifactLink {
                url: file.url.clone(),
                rel: LinkRel::ReleaseFile,
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    fn index_url(&self) -> &str {
        &self.index_url
    }
}
