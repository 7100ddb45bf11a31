use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper bound on timed style reassertions.
pub const MAX_REASSERTIONS: usize = 10;
const MAX_REASSERT_DELAY_MS: u64 = 60_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Element ids the overlay looks up or reserves in the host tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementIds {
    /// The host application's own root container.
    #[serde(default = "default_host_root")]
    pub host_root: String,
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default = "default_wrapper")]
    pub wrapper: String,
    #[serde(default = "default_panel")]
    pub panel: String,
    #[serde(default = "default_toggle")]
    pub toggle: String,
    #[serde(default = "default_style")]
    pub style: String,
}

fn default_host_root() -> String {
    "root".to_string()
}
fn default_layout() -> String {
    "catstats-layout".to_string()
}
fn default_wrapper() -> String {
    "catstats-main".to_string()
}
fn default_panel() -> String {
    "catstats-panel".to_string()
}
fn default_toggle() -> String {
    "catstats-toggle".to_string()
}
fn default_style() -> String {
    "catstats-style".to_string()
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            host_root: default_host_root(),
            layout: default_layout(),
            wrapper: default_wrapper(),
            panel: default_panel(),
            toggle: default_toggle(),
            style: default_style(),
        }
    }
}

impl ElementIds {
    /// Ids the overlay creates, in creation order.
    pub fn reserved(&self) -> [&str; 5] {
        [
            self.layout.as_str(),
            self.wrapper.as_str(),
            self.panel.as_str(),
            self.toggle.as_str(),
            self.style.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverlayConfig {
    /// Statistics endpoint; `?range=` is appended per request.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_avatar_base")]
    pub avatar_base: String,
    /// Stylesheet asserted into the document head. Treated as opaque text.
    #[serde(default = "default_style_payload")]
    pub style_payload: String,
    /// Delays after startup at which the stylesheet is re-checked.
    #[serde(default = "default_reassert_delays")]
    pub reassert_delays_ms: Vec<u64>,
    #[serde(default)]
    pub ids: ElementIds,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8000/api/stats".to_string()
}
fn default_avatar_base() -> String {
    "/public/avatars".to_string()
}
fn default_style_payload() -> String {
    include_str!("overlay.css").to_string()
}
fn default_reassert_delays() -> Vec<u64> {
    vec![500, 1500, 3000]
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            avatar_base: default_avatar_base(),
            style_payload: default_style_payload(),
            reassert_delays_ms: default_reassert_delays(),
            ids: ElementIds::default(),
        }
    }
}

impl OverlayConfig {
    /// Load config from `path`, falling back to defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize and write this config to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<PathBuf, ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(path.to_path_buf())
    }

    /// Validate the config
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            issues.push(format!(
                "Invalid endpoint: '{}' (must start with http:// or https://)",
                self.endpoint
            ));
        }
        if self.ids.host_root.trim().is_empty() {
            issues.push("ids.host_root must not be empty".to_string());
        }
        let reserved = self.ids.reserved();
        for (i, id) in reserved.iter().enumerate() {
            if id.trim().is_empty() {
                issues.push(format!("Reserved id #{} must not be empty", i + 1));
                continue;
            }
            if *id == self.ids.host_root {
                issues.push(format!("Reserved id '{}' collides with the host root", id));
            }
            if reserved[..i].contains(id) {
                issues.push(format!("Reserved id '{}' is used twice", id));
            }
        }
        if self.reassert_delays_ms.len() > MAX_REASSERTIONS {
            issues.push(format!(
                "Too many reassert_delays_ms entries: {} (max {})",
                self.reassert_delays_ms.len(),
                MAX_REASSERTIONS
            ));
        }
        if let Some(d) = self
            .reassert_delays_ms
            .iter()
            .find(|&&d| d > MAX_REASSERT_DELAY_MS)
        {
            issues.push(format!(
                "reassert delay {}ms exceeds {}ms",
                d, MAX_REASSERT_DELAY_MS
            ));
        }
        if self.reassert_delays_ms.windows(2).any(|w| w[0] > w[1]) {
            issues.push(format!(
                "reassert_delays_ms must be ascending: {:?}",
                self.reassert_delays_ms
            ));
        }
        issues
    }
}
