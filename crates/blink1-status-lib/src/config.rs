//! Persistent settings for the light: `config.toml` under the platform config dir.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::DEFAULT_GAMMA;
use crate::light::{DEFAULT_FADE_MS, DEFAULT_NAME};

/// First lines of every saved file.
const CONFIG_HEADER: &str = "# blink1-status configuration\n\n";

const APP_DIR: &str = "blink1-status";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display name of the light entity. Default: "Blink1".
    #[serde(default = "default_name")]
    pub name: String,

    /// Fade time for turn-on commands, in milliseconds. Default: 100.
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u32,

    /// Gamma applied to each channel before it is sent. Default: 2.0.
    #[serde(default = "default_gamma")]
    pub gamma: f32,

    /// How long to wait for a device call on the offload worker. Default: 5000.
    #[serde(default = "default_offload_timeout_ms")]
    pub offload_timeout_ms: u64,
}

fn default_name() -> String {
    DEFAULT_NAME.into()
}
fn default_fade_ms() -> u32 {
    DEFAULT_FADE_MS
}
fn default_gamma() -> f32 {
    DEFAULT_GAMMA
}
fn default_offload_timeout_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: default_name(),
            fade_ms: default_fade_ms(),
            gamma: default_gamma(),
            offload_timeout_ms: default_offload_timeout_ms(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// The `name` field is empty or whitespace-only.
    EmptyName,
    /// The `gamma` field is not a positive finite number.
    InvalidGamma(f32),
    /// The `offload_timeout_ms` field is zero.
    ZeroTimeout,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyName => write!(f, "Name cannot be empty"),
            ValidationError::InvalidGamma(g) => {
                write!(f, "Invalid gamma: {g} (must be a positive number)")
            }
            ValidationError::ZeroTimeout => write!(f, "offload_timeout_ms must be at least 1"),
        }
    }
}

impl Config {
    /// `<config_dir>/blink1-status`, if the platform has a config directory.
    pub fn dir() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(APP_DIR))
    }

    pub fn path() -> Option<PathBuf> {
        Some(Self::dir()?.join(CONFIG_FILE))
    }

    /// Load from the default path. Parse problems are logged and defaults used.
    pub fn load() -> Self {
        match Self::path() {
            Some(path) => {
                let (config, warnings) = Self::load_from(&path);
                warnings.iter().for_each(|w| log::warn!("{w}"));
                config
            }
            None => Self::default(),
        }
    }

    /// Load from `path`.
    ///
    /// A missing file yields defaults and no warnings. An unreadable or
    /// malformed file yields defaults and one warning.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return (Self::default(), vec![]),
            Err(e) => {
                return (
                    Self::default(),
                    vec![format!("cannot read {}: {e}", path.display())],
                );
            }
        };
        toml::from_str(&contents).map_or_else(
            |e| {
                (
                    Self::default(),
                    vec![format!(
                        "config parse error ({}), using defaults: {e}",
                        path.display()
                    )],
                )
            },
            |config| (config, vec![]),
        )
    }

    /// Write to `path`, creating parent directories.
    ///
    /// The file is written next to `path` and renamed over it; if the rename
    /// fails the contents are written in place.
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = [CONFIG_HEADER, body.as_str()].concat();

        let staging = path.with_extension("toml.tmp");
        std::fs::write(&staging, &contents)?;
        if std::fs::rename(&staging, path).is_err() {
            let _ = std::fs::remove_file(&staging);
            std::fs::write(path, &contents)?;
        }
        Ok(())
    }

    /// Offload timeout as a `Duration`.
    pub fn offload_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.offload_timeout_ms)
    }

    /// Check every field, returning all problems found.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let gamma_ok = self.gamma.is_finite() && self.gamma > 0.0;
        let errors: Vec<ValidationError> = [
            self.name
                .trim()
                .is_empty()
                .then_some(ValidationError::EmptyName),
            (!gamma_ok).then_some(ValidationError::InvalidGamma(self.gamma)),
            (self.offload_timeout_ms == 0).then_some(ValidationError::ZeroTimeout),
        ]
        .into_iter()
        .flatten()
        .collect();

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Validate and fold all problems into a single [`Blink1Error::Config`](crate::Blink1Error::Config).
    pub fn ensure_valid(&self) -> crate::error::Result<()> {
        self.validate().map_err(|errors| {
            let msgs: Vec<String> = errors.iter().map(ToString::to_string).collect();
            crate::Blink1Error::Config(msgs.join("; "))
        })
    }
}
