//! The sync run: plan which releases are missing, then move their files.

use std::fs::File;

use anyhow::{Context, anyhow};
use log::{debug, info, warn};

use crate::error::SyncError;
use crate::http::HttpClient;
use crate::index::{IndexClient, Uploader};
use crate::presence::check_presence;
use crate::request::RequestSet;
use crate::resolve::{Resolution, resolve};

/// What one run did.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// "name version" for every release that was transferred.
    pub synced: Vec<String>,
    /// Names the destination already satisfied.
    pub already_present: Vec<String>,
    pub files_transferred: usize,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} package(s) synced, {} already present, {} file(s) transferred",
            self.synced.len(),
            self.already_present.len(),
            self.files_transferred
        )
    }
}

/// Mirrors the requested packages from `origin` to the destination.
///
/// Planning happens up front: every request is either already present,
/// resolved to a release on the origin, or missing. If anything is
/// missing the run stops before transferring a single file, so a partial
/// requirements list never half-fills the destination. Downloads land in
/// a temporary directory that is dropped when the run ends, successful
/// or not.
pub async fn run(
    requests: &RequestSet,
    origin: &dyn IndexClient,
    destination: &dyn IndexClient,
    uploader: &dyn Uploader,
    http: &HttpClient,
) -> Result<SyncReport, SyncError> {
    let mut report = SyncReport::default();

    let presence = check_presence(requests, destination).await;

    let mut plan: Vec<(String, Resolution)> = Vec::new();
    let mut missing: Vec<String> = Vec::new();

    for request in requests.iter() {
        if presence.get(&request.name).copied().unwrap_or(false) {
            info!("{} is already on {}", request, destination.index_url());
            report.already_present.push(request.name.clone());
            continue;
        }

        match resolve(request, origin).await {
            Ok(Some(resolution)) if !resolution.links.is_empty() => {
                debug!(
                    "Will sync {} {} ({} files) from {}",
                    request.name,
                    resolution.version,
                    resolution.links.len(),
                    origin.index_url()
                );
                plan.push((request.name.clone(), resolution));
            }
            Ok(Some(resolution)) => {
                warn!(
                    "{} {} has no release files on {}",
                    request.name,
                    resolution.version,
                    origin.index_url()
                );
                missing.push(request.to_string());
            }
            Ok(None) => {
                warn!("{} not found on {}", request, origin.index_url());
                missing.push(request.to_string());
            }
            Err(err) => return Err(err.into()),
        }
    }

    if !missing.is_empty() {
        return Err(SyncError::ResolutionShortfall(missing));
    }

    if plan.is_empty() {
        info!("Nothing to sync");
        return Ok(report);
    }

    let workdir = tempfile::tempdir().context("Failed to create download directory")?;

    for (name, resolution) in &plan {
        for link in &resolution.links {
            let filename = filename_from_url(&link.url)?;
            let path = workdir.path().join(&filename);

            debug!("Downloading {} to {}...", link.url, path.display());
            http.download_file(&link.url, || {
                File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))
            })
            .await
            .with_context(|| format!("Failed to download {}", link.url))?;

            uploader.upload(&path, name, &resolution.version).await?;
            report.files_transferred += 1;
        }

        info!("Synced {} {}", name, resolution.version);
        report.synced.push(format!("{} {}", name, resolution.version));
    }

    Ok(report)
}

/// Takes the file name from a download URL, dropping query and fragment.
fn filename_from_url(url: &str) -> Result<String, SyncError> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query.rsplit('/').next().unwrap_or(without_query);
    if name.is_empty() {
        return Err(anyhow!("Download URL {} has no file name", url).into());
    }
    Ok(name.to_string())
}
