//! Configuration loaded from TOML.

use crate::error::{RedactorError, RedactorResult};
use crate::report::HighlightStyle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub detector: DetectorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Abort the request on an invalid rule instead of skipping it
    #[serde(default = "default_strict_rules")]
    pub strict_rules: bool,

    /// MuPDF search hit cap per matched string per page
    #[serde(default = "default_max_hits")]
    pub max_hits_per_text: u32,

    /// Glyph written over redacted characters in flow documents
    #[serde(default = "default_block_glyph")]
    pub block_glyph: char,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_highlight_open")]
    pub highlight_open: String,

    #[serde(default = "default_highlight_close")]
    pub highlight_close: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    #[serde(default = "default_blobs_dir")]
    pub blobs_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// External detector endpoints. Unset endpoints fall back to the built-in
/// pattern detector (entities) or to no detector (prompts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_endpoint: Option<String>,

    #[serde(default = "default_detector_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_rules: default_strict_rules(),
            max_hits_per_text: default_max_hits(),
            block_glyph: default_block_glyph(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            highlight_open: default_highlight_open(),
            highlight_close: default_highlight_close(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            reports_dir: default_reports_dir(),
            blobs_dir: default_blobs_dir(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            entity_endpoint: None,
            prompt_endpoint: None,
            timeout_secs: default_detector_timeout_secs(),
        }
    }
}

impl ReportConfig {
    pub fn highlight_style(&self) -> HighlightStyle {
        HighlightStyle {
            open: self.highlight_open.clone(),
            close: self.highlight_close.clone(),
        }
    }
}

fn default_strict_rules() -> bool {
    true
}

fn default_max_hits() -> u32 {
    500
}

fn default_block_glyph() -> char {
    crate::redaction::docx::BLOCK_GLYPH
}

fn default_highlight_open() -> String {
    HighlightStyle::default().open
}

fn default_highlight_close() -> String {
    HighlightStyle::default().close
}

fn default_reports_dir() -> PathBuf {
    data_dir().join("reports")
}

fn default_blobs_dir() -> PathBuf {
    data_dir().join("blobs")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_detector_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    concat!("docredact/", env!("CARGO_PKG_VERSION")).to_string()
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "docredact", "docredact")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".docredact"))
}

impl Config {
    /// Loads config from `path`, or from the default location.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> RedactorResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|e| RedactorError::Io {
            path: path.clone(),
            source: e,
        })?;
        Self::from_toml(&content).map_err(|reason| RedactorError::Config { path, reason })
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "docredact", "docredact") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from(".docredact/config.toml")
        }
    }
}
