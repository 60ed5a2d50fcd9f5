//! GitHub REST API client
//!
//! Covers the three endpoints this tool needs: repository metadata (for the
//! default branch), the recursive Git Trees listing, and raw file contents.

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FetchError;

const API_BASE: &str = "https://api.github.com";
const RAW_BASE: &str = "https://raw.githubusercontent.com";
const GITHUB_V3_ACCEPT: &str = "application/vnd.github.v3+json";

/// One node of the recursive tree listing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Entry discriminator from the Git Trees API. Submodules arrive as
/// `commit` entries and fold into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Blob,
    Tree,
    Other,
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let kind = String::deserialize(deserializer)?;
        Ok(match kind.as_str() {
            "blob" => EntryKind::Blob,
            "tree" => EntryKind::Tree,
            _ => EntryKind::Other,
        })
    }
}

/// Response envelope of `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`.
#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

/// The slice of repository metadata we care about.
#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

/// Thin client over the GitHub endpoints this tool needs.
///
/// Constructed per invocation; holds no state beyond the HTTP client and the
/// optional static token.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    token: Option<String>,
    api_base: String,
    raw_base: String,
}

impl GitHubClient {
    /// Create a client with the given static token and request timeout.
    pub fn new(token: Option<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            // GitHub rejects requests without a User-Agent
            .user_agent(concat!("repofetch/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            token,
            api_base: API_BASE.to_string(),
            raw_base: RAW_BASE.to_string(),
        })
    }

    /// Point the client at alternate hosts. Tests use this to target a mock
    /// server.
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        raw_base: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.raw_base = raw_base.into();
        self
    }

    /// Headers sent on every request: the v3 Accept header, plus the token
    /// when one is present.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_ACCEPT));

        if let Some(token) = &self.token {
            match HeaderValue::from_str(&format!("token {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    warn!("token contains characters not valid in a header; sending unauthenticated");
                }
            }
        }

        headers
    }

    /// Resolve the repository's default branch from its metadata.
    pub async fn resolve_default_branch(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<String, FetchError> {
        let url = format!("{}/repos/{}/{}", self.api_base, owner, repo);
        debug!("resolving default branch via {}", url);

        let response = self.get(&url).await?;
        let info: RepoInfo = response.json().await?;

        debug!(
            "default branch of {}/{} is {}",
            owner, repo, info.default_branch
        );
        Ok(info.default_branch)
    }

    /// Fetch the full recursive tree listing for a ref.
    ///
    /// A listing flagged `truncated` by the provider is refused outright:
    /// filtering a partial tree would silently drop files.
    pub async fn get_tree_contents(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
    ) -> Result<Vec<TreeEntry>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, owner, repo, reference
        );
        debug!("fetching recursive tree via {}", url);

        let response = self.get(&url).await?;
        let listing: TreeResponse = response.json().await?;

        if listing.truncated {
            return Err(FetchError::Truncated {
                reference: reference.to_string(),
            });
        }

        Ok(listing.tree)
    }

    /// Fetch the raw bytes of one file at the given ref.
    pub async fn fetch_raw(
        &self,
        owner: &str,
        repo: &str,
        reference: &str,
        path: &str,
    ) -> Result<Vec<u8>, FetchError> {
        let url = format!(
            "{}/{}/{}/{}/{}",
            self.raw_base, owner, repo, reference, path
        );
        debug!("downloading {}", url);

        let response = self.get(&url).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Issue a GET and map non-success statuses onto the error taxonomy.
    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let response = self.http.get(url).headers(self.headers()).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FetchError::Auth {
                status: response.status().as_u16(),
                url: url.to_string(),
            }),
            StatusCode::NOT_FOUND => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            status => Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
        }
    }
}

/// Resolve the static token: explicit flag first, then config file, then the
/// GITHUB_TOKEN environment variable. Returns `None` for unauthenticated
/// access.
pub fn resolve_token(flag: Option<String>, configured: Option<String>) -> Option<String> {
    let token = flag
        .or(configured)
        .or_else(|| env::var("GITHUB_TOKEN").ok())
        .filter(|token| !token.is_empty())?;

    if !token.starts_with("ghp_")
        && !token.starts_with("gho_")
        && !token.starts_with("ghs_")
        && !token.starts_with("github_pat_")
    {
        warn!("token doesn't look like a GitHub token (expected a ghp_, gho_, ghs_, or github_pat_ prefix)");
    }

    Some(token)
}

/// Parse an `owner/repo` slug or a full GitHub URL into `(owner, repo)`.
///
/// Accepts `owner/repo`, `https://github.com/owner/repo`, and the `.git`
/// suffixed form.
pub fn parse_repo_slug(input: &str) -> Result<(String, String)> {
    let trimmed = input
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("github.com/");

    let mut parts = trimmed.trim_matches('/').splitn(3, '/');
    let owner = parts.next().unwrap_or_default();
    let repo = parts.next().unwrap_or_default();

    if owner.is_empty() || repo.is_empty() {
        return Err(anyhow!(
            "expected 'owner/repo' or a GitHub URL, got: {}",
            input
        ));
    }

    let repo = repo.trim_end_matches(".git");
    Ok((owner.to_string(), repo.to_string()))
}
