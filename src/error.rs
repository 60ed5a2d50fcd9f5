use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure modes surfaced by the fetch pipeline.
///
/// Nothing here is recovered internally; every call hands its failure to the
/// immediate caller, and the CLI wraps it with `anyhow` context. A folder
/// download aborts on the first error without removing files already written.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: DNS, connect, TLS, or a broken body stream.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The provider rejected our credentials (HTTP 401/403).
    #[error("authentication rejected (HTTP {status}) for {url}")]
    Auth { status: u16, url: String },

    /// Repository, ref, or path does not exist (HTTP 404).
    #[error("not found: {url}")]
    NotFound { url: String },

    /// The recursive tree listing was cut short by the provider. The file
    /// selection would be incomplete, so the whole operation is refused.
    #[error("tree listing for '{reference}' is truncated; the repository is too large to list in one request")]
    Truncated { reference: String },

    /// Directory creation or file write failed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other non-success HTTP status.
    #[error("unexpected HTTP {status} from {url}")]
    Status { status: u16, url: String },
}
