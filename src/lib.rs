//! repofetch - Selective GitHub Folder Downloads
//!
//! repofetch pulls a chosen folder (or the whole tree) out of a GitHub
//! repository without cloning it, selecting paths with include/exclude glob
//! patterns and mirroring the folder's relative structure under a local
//! destination directory.
//!
//! ## Core Features
//!
//! - **Glob Filtering**: Include/exclude patterns over full repository paths,
//!   exclude always wins
//! - **Single Round-Trip Listing**: One recursive Git Trees call per run,
//!   refused when the provider truncates it
//! - **Ref Pinning**: Download from a branch, tag, or commit, or let the
//!   default branch resolve automatically
//! - **Configuration Management**: YAML-based configuration with XDG
//!   compliance
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: GitHub REST API client
//! - [`filter`]: Path filtering core
//! - [`download`]: Sequential download engine

pub mod config;
pub mod download;
pub mod error;
pub mod filter;
pub mod github;

pub use config::Config;
pub use download::{DownloadSummary, Downloader, FetchRequest};
pub use error::FetchError;
pub use filter::DownloadTarget;
pub use github::{GitHubClient, TreeEntry};
