use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for repofetch
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Default destination directory for downloads
    #[serde(default = "default_destination")]
    pub destination: String,

    /// GitHub access settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Default include/exclude patterns, used when the command line
    /// supplies none
    #[serde(default)]
    pub patterns: PatternConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// GitHub access configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct GitHubConfig {
    /// Static personal access token. Prefer the GITHUB_TOKEN environment
    /// variable over storing one here.
    pub token: Option<String>,
}

/// Default glob pattern sets
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PatternConfig {
    /// A path must match one of these to be downloaded (empty = everything)
    #[serde(default)]
    pub include: Vec<String>,

    /// A path matching any of these is never downloaded
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// HTTP client configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

// Default value functions
fn default_destination() -> String {
    ".".to_string()
}
fn default_timeout() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            github: GitHubConfig::default(),
            patterns: PatternConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to
    /// defaults when no config file exists yet.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repofetch").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.destination = shellexpand::full(&self.destination)
            .context("Failed to expand destination path")?
            .into_owned();

        Ok(())
    }

    /// The configured destination as a path
    pub fn destination_path(&self) -> PathBuf {
        PathBuf::from(&self.destination)
    }
}
