//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults, an optional TOML
//! file (`~/.config/wtail/config.toml` or `--config <PATH>`, feature `config`), and command-line
//! flags. Every numeric setting is clamped by [`TailConfig::normalized`].
//!
//! ```toml
//! max_lines = 20000
//! initial_lines = 200
//! filter = "error|warn"
//! wrap = false
//! follow = true
//! poll_interval_ms = 250
//! theme = "high-contrast"
//! ```

use crate::buffer::{clamp_max_lines, DEFAULT_MAX_LINES, MAX_MAX_LINES};
use crate::error::{Result, WtailError};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Lines loaded from the end of a file when it is opened
pub const DEFAULT_INITIAL_LINES: usize = 100;
/// Polling period
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
/// Fastest allowed polling period
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

/// Named color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum ThemeName {
    #[default]
    Default,
    Monochrome,
    HighContrast,
}

impl FromStr for ThemeName {
    type Err = WtailError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "monochrome" | "mono" => Ok(Self::Monochrome),
            "high-contrast" | "high_contrast" | "contrast" => Ok(Self::HighContrast),
            other => Err(WtailError::InvalidArgument {
                message: format!(
                    "unknown theme '{other}' (expected default, monochrome or high-contrast)"
                ),
            }),
        }
    }
}

/// Every tunable of a tail session
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TailConfig {
    /// Line buffer capacity, clamped to `[200, 200000]`
    pub max_lines: usize,
    /// Lines loaded from the end of the file on open
    pub initial_lines: usize,
    /// Case-insensitive regex; empty disables filtering
    pub filter: String,
    pub wrap: bool,
    /// Keep the view scrolled to the newest line
    pub follow: bool,
    pub poll_interval_ms: u64,
    pub theme: ThemeName,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
            initial_lines: DEFAULT_INITIAL_LINES,
            filter: String::new(),
            wrap: false,
            follow: true,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            theme: ThemeName::Default,
        }
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub max_lines: Option<usize>,
    pub initial_lines: Option<usize>,
    pub poll_interval_ms: Option<u64>,
    pub filter: Option<String>,
    pub wrap: Option<bool>,
    pub follow: Option<bool>,
    pub theme: Option<ThemeName>,
}

impl TailConfig {
    /// Clamp every numeric setting into its valid range
    pub fn normalized(mut self) -> Self {
        self.max_lines = clamp_max_lines(self.max_lines);
        self.initial_lines = self.initial_lines.min(MAX_MAX_LINES);
        self.poll_interval_ms = self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Apply command-line overrides and normalize
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(max_lines) = overrides.max_lines {
            self.max_lines = max_lines;
        }
        if let Some(initial_lines) = overrides.initial_lines {
            self.initial_lines = initial_lines;
        }
        if let Some(interval) = overrides.poll_interval_ms {
            self.poll_interval_ms = interval;
        }
        if let Some(filter) = overrides.filter {
            self.filter = filter;
        }
        if let Some(wrap) = overrides.wrap {
            self.wrap = wrap;
        }
        if let Some(follow) = overrides.follow {
            self.follow = follow;
        }
        if let Some(theme) = overrides.theme {
            self.theme = theme;
        }
        self.normalized()
    }

    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, the per-user file is used when
    /// present; a broken per-user file is logged and ignored.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => Ok(Self::load_user_config()),
        }
    }

    #[cfg(feature = "config")]
    fn load_user_config() -> Self {
        let Some(path) = Self::user_config_path() else {
            return Self::default();
        };
        if !path.is_file() {
            log::debug!("no config file at {}", path.display());
            return Self::default();
        }
        match Self::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("ignoring {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    #[cfg(not(feature = "config"))]
    fn load_user_config() -> Self {
        Self::default()
    }

    /// `<config dir>/wtail/config.toml`
    #[cfg(feature = "config")]
    pub fn user_config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wtail").join("config.toml"))
    }

    /// Parse a TOML file
    #[cfg(feature = "config")]
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WtailError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)
            .map_err(|e| WtailError::config(format!("{}: {}", path.display(), e)))?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    #[cfg(not(feature = "config"))]
    pub fn from_file(path: &Path) -> Result<Self> {
        Err(WtailError::config(format!(
            "cannot load {}: built without the `config` feature",
            path.display()
        )))
    }

    /// Parse TOML text; missing keys take their defaults
    #[cfg(feature = "config")]
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map(Self::normalized)
            .map_err(|e| WtailError::config(e.to_string()))
    }
}
