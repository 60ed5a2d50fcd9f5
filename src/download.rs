//! Download Engine - Orchestrates selective folder downloads
//!
//! This module coordinates ref resolution, tree retrieval, path filtering,
//! and the sequential file fetches that write the selection to disk.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::FetchError;
use crate::filter::{self, DownloadTarget};
use crate::github::GitHubClient;

/// Everything needed to fetch one folder subtree.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub owner: String,
    pub repo: String,

    /// Folder inside the repository; empty selects the whole tree.
    pub folder: String,

    /// Local destination directory.
    pub dest: PathBuf,

    /// Branch, tag, or commit id; `None` resolves the default branch.
    pub reference: Option<String>,

    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

/// Results from a completed folder download.
#[derive(Debug, Clone)]
pub struct DownloadSummary {
    pub total_files: usize,
    pub bytes_written: u64,
    pub duration: Duration,
}

/// The download engine. Plain value type, constructed per invocation; the
/// whole run is a stateless pipeline from request to filesystem writes.
pub struct Downloader {
    client: GitHubClient,
}

impl Downloader {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }

    /// Resolve the ref and compute the download plan without fetching any
    /// file contents. Powers `list` and `--dry-run`.
    pub async fn plan(
        &self,
        request: &FetchRequest,
    ) -> Result<(String, Vec<DownloadTarget>), FetchError> {
        let reference = match &request.reference {
            Some(reference) => reference.clone(),
            None => {
                self.client
                    .resolve_default_branch(&request.owner, &request.repo)
                    .await?
            }
        };
        debug!(
            "using ref '{}' for {}/{}",
            reference, request.owner, request.repo
        );

        let tree = self
            .client
            .get_tree_contents(&request.owner, &request.repo, &reference)
            .await?;
        info!("tree listing has {} entries", tree.len());

        let narrowed = filter::narrow_to_folder(tree, &request.folder);
        let paths = filter::filter_paths(&narrowed, &request.includes, &request.excludes);
        let targets = filter::plan_targets(paths, &request.folder, &request.dest);
        info!("{} files selected for download", targets.len());

        Ok((reference, targets))
    }

    /// Download the folder subtree, one file at a time, in listing order.
    ///
    /// Aborts on the first failure; files already written stay on disk.
    pub async fn download_folder(
        &self,
        request: &FetchRequest,
    ) -> Result<DownloadSummary, FetchError> {
        let started = Instant::now();
        let (reference, targets) = self.plan(request).await?;

        let mut bytes_written = 0u64;
        for target in &targets {
            bytes_written += self
                .download_file(&request.owner, &request.repo, &reference, target)
                .await?;
        }

        Ok(DownloadSummary {
            total_files: targets.len(),
            bytes_written,
            duration: started.elapsed(),
        })
    }

    /// Fetch one blob and write it to its local path, overwriting any
    /// existing file. Returns the number of bytes written.
    pub async fn download_file(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        target: &DownloadTarget,
    ) -> Result<u64, FetchError> {
        if let Some(parent) = target.local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| FetchError::Filesystem {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let bytes = self
            .client
            .fetch_raw(owner, repo, reference, &target.remote_path)
            .await?;

        tokio::fs::write(&target.local_path, &bytes)
            .await
            .map_err(|source| FetchError::Filesystem {
                path: target.local_path.clone(),
                source,
            })?;

        debug!(
            "wrote {} bytes to {}",
            bytes.len(),
            target.local_path.display()
        );
        Ok(bytes.len() as u64)
    }
}
