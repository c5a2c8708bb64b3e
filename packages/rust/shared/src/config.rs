//! Application configuration for leafdex.
//!
//! User config lives at `~/.leafdex/leafdex.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{LeafdexError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "leafdex.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".leafdex";

// ---------------------------------------------------------------------------
// Config structs (matching leafdex.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the catalog lives and how its pages are laid out.
    #[serde(default)]
    pub site: SiteConfig,

    /// Run defaults.
    #[serde(default)]
    pub run: RunDefaults,

    /// Text reconstruction settings.
    #[serde(default)]
    pub text: TextConfig,
}

/// `[site]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// The catalog index page.
    #[serde(default = "default_index_url")]
    pub index_url: String,

    /// Path segment every item URL lives under.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Path segment of "related topic" links collected as tags.
    #[serde(default = "default_related_path")]
    pub related_path: String,

    /// Consent overlay selectors, tried in order until one matches.
    #[serde(default = "default_consent_selectors")]
    pub consent_selectors: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            index_url: default_index_url(),
            catalog_path: default_catalog_path(),
            related_path: default_related_path(),
            consent_selectors: default_consent_selectors(),
        }
    }
}

fn default_index_url() -> String {
    "https://www.nhs.uk/medicines/".into()
}
fn default_catalog_path() -> String {
    "/medicines/".into()
}
fn default_related_path() -> String {
    "/conditions/".into()
}
fn default_consent_selectors() -> Vec<String> {
    vec![
        "#nhsuk-cookie-banner".into(),
        "#cookiebanner".into(),
        r#"[aria-label="Cookie banner"]"#.into(),
        ".cookie-banner".into(),
    ]
}

/// `[run]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDefaults {
    /// Maximum concurrent item extractions.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause (ms) a task takes after releasing its permit.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Per-navigation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Only process the first N catalog entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Where the result document is written.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            limit: None,
            output: default_output(),
        }
    }
}

fn default_concurrency() -> usize {
    3
}
fn default_delay_ms() -> u64 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_output() -> String {
    "medicines.json".into()
}

/// `[text]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Newline-separated word list used for boundary repair.
    #[serde(default = "default_dictionary_path")]
    pub dictionary_path: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            dictionary_path: default_dictionary_path(),
        }
    }
}

fn default_dictionary_path() -> String {
    "/usr/share/dict/words".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// The catalog index page.
    pub index_url: Url,
    /// Path segment every item URL lives under.
    pub catalog_path: String,
    /// Path segment of related-topic links.
    pub related_path: String,
    /// Consent overlay selectors, in priority order.
    pub consent_selectors: Vec<String>,
    /// Scheduler capacity.
    pub concurrency: usize,
    /// Inter-task delay, applied after a permit is released.
    pub delay: Duration,
    /// Per-navigation timeout.
    pub timeout: Duration,
    /// Processing cap.
    pub limit: Option<usize>,
    /// Output file for the result document.
    pub output: PathBuf,
    /// Word list location.
    pub dictionary_path: PathBuf,
}

impl TryFrom<&AppConfig> for RunConfig {
    type Error = LeafdexError;

    fn try_from(config: &AppConfig) -> Result<Self> {
        let index_url = Url::parse(&config.site.index_url).map_err(|e| {
            LeafdexError::config(format!("invalid index_url '{}': {e}", config.site.index_url))
        })?;

        let run = Self {
            index_url,
            catalog_path: config.site.catalog_path.clone(),
            related_path: config.site.related_path.clone(),
            consent_selectors: config.site.consent_selectors.clone(),
            concurrency: config.run.concurrency,
            delay: Duration::from_millis(config.run.delay_ms),
            timeout: Duration::from_secs(config.run.timeout_secs),
            limit: config.run.limit,
            output: PathBuf::from(&config.run.output),
            dictionary_path: PathBuf::from(&config.text.dictionary_path),
        };
        run.validate()?;
        Ok(run)
    }
}

impl RunConfig {
    /// Reject settings the scheduler or catalog builder cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(LeafdexError::config("concurrency must be at least 1"));
        }
        if self.timeout.is_zero() {
            return Err(LeafdexError::config("timeout_secs must be at least 1"));
        }
        if !self.catalog_path.starts_with('/') {
            return Err(LeafdexError::config(format!(
                "catalog_path '{}' must start with '/'",
                self.catalog_path
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.leafdex/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| LeafdexError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.leafdex/leafdex.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LeafdexError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| LeafdexError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LeafdexError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| LeafdexError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LeafdexError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
