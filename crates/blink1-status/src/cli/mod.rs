//! Subcommands of the `blink1-status` binary and their shared output helpers.

mod config_cmd;
mod light_cmd;
mod status;

use std::path::Path;

use clap::Subcommand;
use serde::Serialize;

pub(super) use blink1_status_lib::color::{self, HsColor};
pub(super) use blink1_status_lib::config::Config;
pub(super) use blink1_status_lib::device::{DeviceInfo, PlatformDevice};
pub(super) use blink1_status_lib::error::Result;
pub(super) use blink1_status_lib::light::{ColorMode, LightEntity, TurnOnParams};
pub(super) use blink1_status_lib::platform;

/// Minimum gap between the longest key and its value.
const GAP: usize = 2;
const INDENT: &str = "  ";

/// Column at which values start, shared by top-level and indented keys.
pub(super) fn kv_width(top: &[&str], indent: &[&str]) -> usize {
    fn widest(keys: &[&str], extra: usize) -> usize {
        keys.iter().map(|k| k.len() + GAP + extra).max().unwrap_or(0)
    }
    widest(top, 0).max(widest(indent, INDENT.len()))
}

/// `key` left-aligned to `w` columns, then `value`.
pub(super) fn format_kv(key: &str, value: impl std::fmt::Display, w: usize) -> String {
    format!("{key:<w$}{value}")
}

pub(super) fn kv(key: &str, value: impl std::fmt::Display, w: usize) {
    println!("{}", format_kv(key, value, w));
}

pub(super) fn kv_indent(key: &str, value: impl std::fmt::Display, w: usize) {
    let inner = w.saturating_sub(INDENT.len());
    println!("{INDENT}{}", format_kv(key, value, inner));
}

/// Pretty-print a value as JSON on stdout.
pub(super) fn print_json(value: &impl Serialize) -> Result<()> {
    let json_str = serde_json::to_string_pretty(value).map_err(|e| {
        blink1_status_lib::Blink1Error::Config(format!("JSON serialization failed: {e}"))
    })?;
    println!("{json_str}");
    Ok(())
}

/// Load config from `custom_path` if given, else from the default location.
pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    match custom_path {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct LightStateJson {
    pub name: String,
    pub unique_id: String,
    pub is_on: Option<bool>,
    pub hs_color: HsColor,
    pub brightness: u8,
    pub rgb: String,
}

#[derive(Serialize)]
pub(super) struct StatusOutput {
    pub version: String,
    pub device: Option<DeviceInfo>,
    pub entity: Option<EntityJson>,
    pub config: ConfigSummaryJson,
}

#[derive(Serialize)]
pub(super) struct EntityJson {
    pub name: String,
    pub unique_id: String,
    pub color_mode: ColorMode,
    pub supported_color_modes: Vec<ColorMode>,
    pub assumed_state: bool,
}

#[derive(Serialize)]
pub(super) struct ConfigSummaryJson {
    pub name: String,
    pub fade_ms: u32,
    pub gamma: f32,
}

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// Turn the light on (HS color and brightness, or a named/hex color)
    On {
        /// Hue in degrees (0-360; saturation defaults to 100 when only hue is given)
        #[arg(long, allow_negative_numbers = true)]
        hue: Option<f64>,
        /// Saturation in percent (0-100)
        #[arg(long, allow_negative_numbers = true)]
        saturation: Option<f64>,
        /// Brightness (0-255)
        #[arg(long, allow_negative_numbers = true)]
        brightness: Option<i32>,
        /// Color as #RRGGBB or a name (red, green, blue, white, orange, ...)
        #[arg(long)]
        color: Option<String>,
    },

    /// Turn the light off
    Off,

    /// Show device, entity and config status
    Status,

    /// Show current configuration and file path
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

pub fn run(cmd: Command, json: bool, config_path: Option<&Path>) -> Result<()> {
    match cmd {
        Command::On {
            hue,
            saturation,
            brightness,
            color,
        } => {
            let params = light_cmd::build_params(hue, saturation, brightness, color.as_deref())?;
            light_cmd::cmd_on(params, json, config_path)
        }
        Command::Off => light_cmd::cmd_off(json, config_path),
        Command::Status => status::cmd_status(json, config_path),
        Command::Config { init } => config_cmd::cmd_config(json, init, config_path),
    }
}
