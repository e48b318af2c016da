use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Extension allow-list for scanning; matched case-insensitively,
    /// leading dots tolerated.
    pub allowed_extensions: Vec<String>,
    /// Glob patterns excluded from traversal (directories and files).
    pub ignore_patterns: Vec<String>,
    /// Files between progress-sink updates during a scan.
    pub progress_interval: usize,
    /// Where `scan` drops reports when no explicit path is given.
    pub report_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_media_extensions(),
            ignore_patterns: Vec::new(),
            progress_interval: 500,
            report_dir: "./reports".to_string(),
        }
    }
}

impl AppConfig {
    /// Allow-list normalized for matching: lower-cased, dots stripped.
    pub fn extension_set(&self) -> HashSet<String> {
        normalize_extensions(&self.allowed_extensions)
    }
}

pub fn normalize_extensions(extensions: &[String]) -> HashSet<String> {
    extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn default_media_extensions() -> Vec<String> {
    [
        // images
        "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp",
        // video
        "mp4", "mov", "avi", "mkv", "wmv", "flv", "webm",
        // apple formats
        "heic", "heif",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
