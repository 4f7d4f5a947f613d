use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::coords::Coordinates;
use crate::secondary::{Channel, LayerMapping};
use crate::store::{default_rank_keys, Rank, RankScale};

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub secondary_download: SecondaryDownloadConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub secondary_dir: SecondaryDirConfig,

    /// Key name → rank value
    #[serde(default = "default_rank_keys")]
    pub ranks: BTreeMap<String, Rank>,

    /// Action name → key combination(s), e.g. `next = "right,down"`
    #[serde(default)]
    pub keys: BTreeMap<String, String>,

    /// Number of rank submissions between two saves
    #[serde(default = "default_save_every")]
    pub save_every: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryDownloadConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Survey name, used in output file names
    #[serde(default = "default_survey_name")]
    pub name: String,

    /// Viewer page for the survey
    #[serde(default = "default_viewer_template")]
    pub url_template: String,

    /// FITS cutout endpoint
    #[serde(default = "default_download_template")]
    pub url_template_download: String,

    /// Layer index → channel(s), e.g. `"0" = ["R", "G"]`
    #[serde(default = "default_extensions")]
    pub extensions: BTreeMap<String, ChannelSpec>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// One channel or a list of channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelSpec {
    One(Channel),
    Many(Vec<Channel>),
}

impl ChannelSpec {
    pub fn channels(&self) -> Vec<Channel> {
        match self {
            ChannelSpec::One(c) => vec![*c],
            ChannelSpec::Many(cs) => cs.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_browser_template")]
    pub url_template: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondaryDirConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub path: String,
}

fn default_true() -> bool {
    true
}

fn default_survey_name() -> String {
    "WISE".to_string()
}

fn default_viewer_template() -> String {
    "https://www.legacysurvey.org/viewer/decals-unwise-neo11/{ra}/{dec}?layer=unwise-neo1&zoom=15"
        .to_string()
}

fn default_download_template() -> String {
    "https://www.legacysurvey.org/viewer/fits-cutout?ra={ra}&dec={dec}&layer=unwise-neo7&size=512&pixscale=0.263672&bands=w1".to_string()
}

fn default_extensions() -> BTreeMap<String, ChannelSpec> {
    let mut extensions = BTreeMap::new();
    extensions.insert(
        "0".to_string(),
        ChannelSpec::Many(vec![Channel::Red, Channel::Green]),
    );
    extensions.insert("1".to_string(), ChannelSpec::Many(vec![Channel::Blue]));
    extensions
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_browser_template() -> String {
    "https://www.legacysurvey.org/viewer/?ra={ra}&dec={dec}&layer=ls-dr10&zoom=16".to_string()
}

fn default_save_every() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for SecondaryDownloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_survey_name(),
            url_template: default_viewer_template(),
            url_template_download: default_download_template(),
            extensions: default_extensions(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url_template: default_browser_template(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            secondary_download: SecondaryDownloadConfig::default(),
            browser: BrowserConfig::default(),
            secondary_dir: SecondaryDirConfig::default(),
            ranks: default_rank_keys(),
            keys: BTreeMap::new(),
            save_every: default_save_every(),
            log_level: default_log_level(),
            log_dir: default_log_dir(),
        }
    }
}

/// Substitute `{ra}` and `{dec}` in a URL template
pub fn render_template(template: &str, coords: &Coordinates) -> String {
    template
        .replace("{ra}", &coords.ra.to_string())
        .replace("{dec}", &coords.dec.to_string())
}

impl AppConfig {
    /// Parse a configuration file; `.json` files are read as JSON, anything
    /// else as TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", path, e))?
        } else {
            toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {:?}: {}", path, e))?
        };
        Ok(config)
    }

    /// Load `path`, falling back to built-in defaults when the file is
    /// missing or unreadable
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => {
                tracing::info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    /// Rank scale built from the `ranks` table
    pub fn rank_scale(&self) -> RankScale {
        RankScale::new(self.ranks.clone())
    }

    /// Save cadence, never below one
    pub fn save_every(&self) -> usize {
        self.save_every.max(1)
    }

    /// Directory holding pre-generated secondary images, when enabled
    pub fn secondary_dir(&self) -> Option<PathBuf> {
        (self.secondary_dir.enabled && !self.secondary_dir.path.is_empty())
            .then(|| PathBuf::from(&self.secondary_dir.path))
    }

    /// Survey viewer link for a position
    pub fn browser_url(&self, coords: &Coordinates) -> Option<String> {
        self.browser
            .enabled
            .then(|| render_template(&self.browser.url_template, coords))
    }
}

impl SecondaryDownloadConfig {
    /// FITS cutout URL for a position
    pub fn download_url(&self, coords: &Coordinates) -> String {
        render_template(&self.url_template_download, coords)
    }

    /// Survey viewer URL for a position
    pub fn viewer_url(&self, coords: &Coordinates) -> String {
        render_template(&self.url_template, coords)
    }

    /// Layer → channel mapping; entries whose key is not a layer index are
    /// ignored
    pub fn layer_mapping(&self) -> LayerMapping {
        let mut mapping = LayerMapping::default();
        for (layer, spec) in &self.extensions {
            match layer.trim().parse::<usize>() {
                Ok(index) => mapping.assign(index, &spec.channels()),
                Err(_) => tracing::warn!("Ignoring extension mapping for non-numeric layer '{}'", layer),
            }
        }
        mapping
    }
}
