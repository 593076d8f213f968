use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

pub const TRACKER_DIR: &str = ".bac-tracker";
const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DB_NAME: &str = "tracker.db";

/// Deployment configuration stored in `.bac-tracker/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationConfig {
    /// Shown on the dashboard header.
    pub name: String,
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        Self {
            name: "Bids and Awards Committee".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Relative paths resolve against the tracker directory.
    pub file: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_DB_NAME),
        }
    }
}

impl TrackerConfig {
    pub fn tracker_dir(root: &Path) -> PathBuf {
        root.join(TRACKER_DIR)
    }

    /// Read config from `root`, falling back to defaults when the file is
    /// missing or cannot be parsed.
    pub async fn read(root: &Path) -> Self {
        let config_path = Self::tracker_dir(root).join(CONFIG_FILE);

        if !config_path.exists() {
            debug!(path = %config_path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(&config_path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %config_path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %config_path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %config_path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn write(&self, root: &Path) -> std::io::Result<()> {
        let config_dir = Self::tracker_dir(root);
        let config_path = config_dir.join(CONFIG_FILE);

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&config_path, content).await?;
        debug!(path = %config_path.display(), "Config saved successfully");

        Ok(())
    }

    pub fn database_path(&self, root: &Path) -> PathBuf {
        if self.database.file.is_absolute() {
            self.database.file.clone()
        } else {
            Self::tracker_dir(root).join(&self.database.file)
        }
    }
}
