use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repofetch::github::{parse_repo_slug, resolve_token};
use repofetch::{Config, Downloader, FetchRequest, GitHubClient};

#[derive(Parser)]
#[command(name = "repofetch")]
#[command(about = "Selective GitHub folder downloads with glob filtering")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a repository folder
    Fetch {
        /// Repository as owner/repo or a full GitHub URL
        repo: String,

        /// Folder inside the repository (defaults to the repository root)
        #[arg(default_value = "")]
        folder: String,

        /// Destination directory (defaults to the configured destination)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Branch, tag, or commit to read (defaults to the default branch)
        #[arg(short, long)]
        r#ref: Option<String>,

        /// Glob pattern a path must match to be downloaded (repeatable)
        #[arg(short, long = "include")]
        include: Vec<String>,

        /// Glob pattern that removes a path from the download (repeatable)
        #[arg(short, long = "exclude")]
        exclude: Vec<String>,

        /// GitHub token (falls back to config, then GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Show what would be downloaded without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// List the files a fetch would download
    List {
        /// Repository as owner/repo or a full GitHub URL
        repo: String,

        /// Folder inside the repository (defaults to the repository root)
        #[arg(default_value = "")]
        folder: String,

        /// Branch, tag, or commit to read (defaults to the default branch)
        #[arg(short, long)]
        r#ref: Option<String>,

        /// Glob pattern a path must match to be listed (repeatable)
        #[arg(short, long = "include")]
        include: Vec<String>,

        /// Glob pattern that removes a path from the listing (repeatable)
        #[arg(short, long = "exclude")]
        exclude: Vec<String>,

        /// GitHub token (falls back to config, then GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,
    },

    /// Create a default configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting repofetch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Fetch {
            repo,
            folder,
            dest,
            r#ref,
            include,
            exclude,
            token,
            dry_run,
        } => {
            cmd_fetch(
                repo, folder, dest, r#ref, include, exclude, token, dry_run, &config,
            )
            .await
        }
        Commands::List {
            repo,
            folder,
            r#ref,
            include,
            exclude,
            token,
        } => cmd_list(repo, folder, r#ref, include, exclude, token, &config).await,
        Commands::Init => cmd_init(&config),
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_or_default(),
    }
}

/// Build a fetch request from command-line arguments and config defaults
fn build_request(
    repo: &str,
    folder: String,
    dest: Option<PathBuf>,
    reference: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    config: &Config,
) -> Result<FetchRequest> {
    let (owner, repo) = parse_repo_slug(repo)?;

    // Command-line patterns replace the configured defaults entirely.
    let includes = if include.is_empty() {
        config.patterns.include.clone()
    } else {
        include
    };
    let excludes = if exclude.is_empty() {
        config.patterns.exclude.clone()
    } else {
        exclude
    };

    Ok(FetchRequest {
        owner,
        repo,
        folder,
        dest: dest.unwrap_or_else(|| config.destination_path()),
        reference,
        includes,
        excludes,
    })
}

fn build_downloader(token: Option<String>, config: &Config) -> Result<Downloader> {
    let token = resolve_token(token, config.github.token.clone());
    let client = GitHubClient::new(token, Duration::from_secs(config.http.timeout))
        .context("Failed to create GitHub client")?;
    Ok(Downloader::new(client))
}

/// Download a repository folder
#[allow(clippy::too_many_arguments)]
async fn cmd_fetch(
    repo: String,
    folder: String,
    dest: Option<PathBuf>,
    reference: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    token: Option<String>,
    dry_run: bool,
    config: &Config,
) -> Result<()> {
    let request = build_request(&repo, folder, dest, reference, include, exclude, config)?;
    let downloader = build_downloader(token, config)?;

    println!("🔍 Resolving repository tree...");

    if dry_run {
        let (reference, targets) = downloader
            .plan(&request)
            .await
            .context("Failed to plan download")?;

        println!(
            "\n🔎 Dry run: {} files from {}/{}@{}",
            targets.len(),
            request.owner,
            request.repo,
            reference
        );
        for target in &targets {
            println!(
                "   📄 {} -> {}",
                target.remote_path,
                target.local_path.display()
            );
        }
        return Ok(());
    }

    let summary = downloader
        .download_folder(&request)
        .await
        .context("Download aborted")?;

    println!("\n🎉 Download Complete!");
    println!("   📄 Files written: {}", summary.total_files);
    println!("   📊 Bytes written: {}", summary.bytes_written);
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("   📁 Destination: {}", request.dest.display());

    Ok(())
}

/// List the files a fetch would download
async fn cmd_list(
    repo: String,
    folder: String,
    reference: Option<String>,
    include: Vec<String>,
    exclude: Vec<String>,
    token: Option<String>,
    config: &Config,
) -> Result<()> {
    let request = build_request(&repo, folder, None, reference, include, exclude, config)?;
    let downloader = build_downloader(token, config)?;

    let (reference, targets) = downloader
        .plan(&request)
        .await
        .context("Failed to list repository files")?;

    println!(
        "Files ({}) at {}/{}@{}:",
        targets.len(),
        request.owner,
        request.repo,
        reference
    );
    for target in &targets {
        println!("  📄 {}", target.remote_path);
    }

    Ok(())
}

/// Create a default configuration file
fn cmd_init(config: &Config) -> Result<()> {
    let config_path = Config::default_config_path()?;

    if config_path.exists() {
        println!("⚠️  Configuration already exists: {:?}", config_path);
        return Ok(());
    }

    config.save(&config_path)?;

    println!("✅ repofetch initialized successfully!");
    println!("   Config: {:?}", config_path);
    println!("   Next: repofetch fetch owner/repo some/folder --dest ./out");

    Ok(())
}
