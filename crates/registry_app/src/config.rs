use std::fs;
use std::path::{Path, PathBuf};

use registry_core::{SearchQuery, SiteConfig};
use registry_logging::{registry_info, registry_warn};
use serde::{Deserialize, Serialize};

/// Environment variable naming the RON configuration file.
pub const CONFIG_ENV: &str = "REGISTRY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./registry.ron";

/// What the binary should crawl and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    /// Searches run in order.
    pub searches: Vec<SearchQuery>,
    /// Fetch the detail page behind each result row.
    pub follow_details: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            searches: SearchQuery::people_by_region(),
            follow_details: false,
        }
    }
}

pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Reads the configuration at `path`, falling back to defaults when the file
/// is missing or unusable.
pub fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            registry_info!("No config at {:?}; using defaults", path);
            return AppConfig::default();
        }
        Err(err) => {
            registry_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            registry_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            registry_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}
