//! Configuration for termaccess.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.termaccess/config.toml`
//! - The verbosity knobs (punctuation level, cursor tracking mode) handed to
//!   the announcement code as an explicit snapshot
//!
//! # Configuration File
//!
//! ```toml
//! # 0 = none, 1 = some, 2 = most, 3 = all
//! punctuation_level = 2
//!
//! # 0 = off, 1 = standard, 2 = highlight, 3 = window
//! cursor_tracking_mode = 1
//!
//! # Quiet period after Enter during which "blank" is not announced
//! blank_suppression_ms = 300
//!
//! # brief or detailed
//! attribute_format = "detailed"
//!
//! # Omit for an unbounded position cache
//! position_cache_capacity = 4096
//!
//! [shaping]
//! bidi = true
//! emoji = true
//!
//! [[profiles]]
//! app_name = "k9s"
//! display_name = "K9s"
//! punctuation_level = 1
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::term::AttributeFormat;
use crate::profile::ApplicationProfile;

const DEFAULT_BLANK_SUPPRESSION_MS: u64 = 300;
const MAX_BLANK_SUPPRESSION_MS: u64 = 5000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("could not determine config path")]
    NoConfigDir,
}

/// How many punctuation symbols are spoken by name
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum PunctuationLevel {
    Off = 0,
    Some = 1,
    #[default]
    Most = 2,
    All = 3,
}

impl From<u8> for PunctuationLevel {
    /// Out-of-range levels clamp to `All`
    fn from(level: u8) -> Self {
        match level {
            0 => Self::Off,
            1 => Self::Some,
            2 => Self::Most,
            3 => Self::All,
            _ => {
                warn!(level, "punctuation level out of range, using 3");
                Self::All
            }
        }
    }
}

impl From<PunctuationLevel> for u8 {
    fn from(level: PunctuationLevel) -> Self {
        level as u8
    }
}

/// What caret movement announces
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum CursorTrackingMode {
    Off = 0,
    #[default]
    Standard = 1,
    Highlight = 2,
    /// Only announce inside the defined window region
    Window = 3,
}

impl From<u8> for CursorTrackingMode {
    /// Out-of-range modes fall back to `Standard`
    fn from(mode: u8) -> Self {
        match mode {
            0 => Self::Off,
            1 => Self::Standard,
            2 => Self::Highlight,
            3 => Self::Window,
            _ => {
                warn!(mode, "cursor tracking mode out of range, using standard");
                Self::Standard
            }
        }
    }
}

impl From<CursorTrackingMode> for u8 {
    fn from(mode: CursorTrackingMode) -> Self {
        mode as u8
    }
}

/// Snapshot of the verbosity knobs, taken at call time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Verbosity {
    pub punctuation: PunctuationLevel,
    pub tracking: CursorTrackingMode,
}

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub punctuation_level: PunctuationLevel,
    pub cursor_tracking_mode: CursorTrackingMode,
    pub blank_suppression_ms: u64,
    pub attribute_format: AttributeFormat,
    /// `None` keeps every position until invalidated
    pub position_cache_capacity: Option<usize>,
    /// Probe positions on a worker thread
    pub background_probe: bool,
    pub shaping: ShapingConfig,
    /// User-defined application profiles
    pub profiles: Vec<ApplicationProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            punctuation_level: PunctuationLevel::default(),
            cursor_tracking_mode: CursorTrackingMode::default(),
            blank_suppression_ms: DEFAULT_BLANK_SUPPRESSION_MS,
            attribute_format: AttributeFormat::default(),
            position_cache_capacity: None,
            background_probe: false,
            shaping: ShapingConfig::default(),
            profiles: Vec::new(),
        }
    }
}

/// Text shaping provider switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    pub bidi: bool,
    pub emoji: bool,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self { bidi: true, emoji: true }
    }
}

impl Config {
    /// Load configuration from the default file, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "using default configuration");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.sanitize();
        Ok(config)
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Write {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reset values that cannot be used as-is. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let mut changed = false;
        if self.blank_suppression_ms > MAX_BLANK_SUPPRESSION_MS {
            warn!(value = self.blank_suppression_ms, "blank suppression window too long, using default");
            self.blank_suppression_ms = DEFAULT_BLANK_SUPPRESSION_MS;
            changed = true;
        }
        if self.position_cache_capacity == Some(0) {
            self.position_cache_capacity = None;
            changed = true;
        }
        changed
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity {
            punctuation: self.punctuation_level,
            tracking: self.cursor_tracking_mode,
        }
    }

    pub fn blank_window(&self) -> Duration {
        Duration::from_millis(self.blank_suppression_ms)
    }

    /// `~/.termaccess/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".termaccess").join("config.toml"))
    }
}

// Get home directory
pub(crate) fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
