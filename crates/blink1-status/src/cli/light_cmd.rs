//! `on` / `off` subcommands: drive the light entity once.

use std::path::Path;

use super::{
    HsColor, LightEntity, LightStateJson, PlatformDevice, Result, TurnOnParams, color, kv,
    kv_width, load_config, platform, print_json,
};

/// Saturation used when only a hue is given.
const HUE_ONLY_SATURATION: f64 = 100.0;

/// Build turn-on parameters from CLI flags.
///
/// `--color` is converted to HS + brightness first; explicit `--hue`,
/// `--saturation` and `--brightness` override the converted values.
pub(super) fn build_params(
    hue: Option<f64>,
    saturation: Option<f64>,
    brightness: Option<i32>,
    color: Option<&str>,
) -> Result<TurnOnParams> {
    let mut params = TurnOnParams::default();

    if let Some(c) = color {
        let (hs, b) = color::rgb_to_hs(color::parse_color(c)?);
        params = params.hs(hs).brightness(i32::from(b));
    }

    if hue.is_some() || saturation.is_some() {
        let base = params
            .hs_color
            .unwrap_or(HsColor::new(0.0, HUE_ONLY_SATURATION));
        params = params.hs(HsColor::new(
            hue.unwrap_or(base.hue),
            saturation.unwrap_or(base.saturation),
        ));
    }

    if let Some(b) = brightness {
        params = params.brightness(b);
    }

    Ok(params)
}

fn light_state(light: &impl LightEntity, rgb: color::Rgb) -> LightStateJson {
    LightStateJson {
        name: light.name().to_string(),
        unique_id: light.unique_id().to_string(),
        is_on: light.is_on(),
        hs_color: light.hs_color(),
        brightness: light.brightness(),
        rgb: color::format_color(rgb),
    }
}

fn print_state(state: &LightStateJson, json: bool) -> Result<()> {
    if json {
        return print_json(state);
    }
    let w = kv_width(&["Light:", "Color:"], &[]);
    let on = match state.is_on {
        Some(true) => "ON",
        Some(false) => "OFF",
        None => "unknown",
    };
    kv("Light:", format_args!("{} ({on})", state.name), w);
    if state.is_on == Some(true) {
        kv(
            "Color:",
            format_args!(
                "{} HS={} Brightness={}",
                state.rgb, state.hs_color, state.brightness
            ),
            w,
        );
    }
    Ok(())
}

pub(super) fn cmd_on(params: TurnOnParams, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    config.ensure_valid()?;
    let mut light = platform::open_light::<PlatformDevice>(&config)?;
    light.turn_on(params)?;
    print_state(&light_state(&light, light.target_rgb()), json)
}

pub(super) fn cmd_off(json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    config.ensure_valid()?;
    let mut light = platform::open_light::<PlatformDevice>(&config)?;
    light.turn_off()?;
    print_state(&light_state(&light, color::Rgb::BLACK), json)
}
