//! `status` subcommand: show device, entity and config status.

use std::path::Path;

use blink1_status_lib::device::StatusLightDevice;

use super::{
    Config, ConfigSummaryJson, DeviceInfo, EntityJson, LightEntity, PlatformDevice, Result,
    StatusOutput, kv, kv_indent, kv_width, load_config, platform, print_json,
};

/// Collect entity metadata from a light.
fn collect_entity(light: &impl LightEntity) -> EntityJson {
    EntityJson {
        name: light.name().to_string(),
        unique_id: light.unique_id().to_string(),
        color_mode: light.color_mode(),
        supported_color_modes: light.supported_color_modes().into_iter().collect(),
        assumed_state: light.assumed_state(),
    }
}

/// Print or serialize the status output.
fn print_status(
    device: Option<DeviceInfo>,
    entity: Option<EntityJson>,
    config: &Config,
    json: bool,
) -> Result<()> {
    let config_summary = ConfigSummaryJson {
        name: config.name.clone(),
        fade_ms: config.fade_ms,
        gamma: config.gamma,
    };

    if json {
        return print_json(&StatusOutput {
            version: env!("CARGO_PKG_VERSION").to_string(),
            device,
            entity,
            config: config_summary,
        });
    }

    let w = kv_width(
        &["Version:", "Device:", "Entity:"],
        &[
            "Product:",
            "Serial:",
            "Firmware:",
            "Path:",
            "Name:",
            "Unique ID:",
            "Color mode:",
            "Supported:",
            "Fade:",
            "Gamma:",
        ],
    );

    kv("Version:", env!("CARGO_PKG_VERSION"), w);
    println!();

    match &device {
        Some(dev) => {
            kv("Device:", "CONNECTED", w);
            kv_indent("Product:", &dev.product, w);
            kv_indent("Serial:", dev.serial.as_deref().unwrap_or("(none)"), w);
            match dev.firmware {
                Some(v) => kv_indent("Firmware:", v, w),
                None => kv_indent("Firmware:", "unknown", w),
            }
            kv_indent("Path:", &dev.path, w);
        }
        None => kv("Device:", "NOT CONNECTED", w),
    }
    println!();

    match &entity {
        Some(e) => {
            kv("Entity:", "light", w);
            kv_indent("Name:", &e.name, w);
            kv_indent("Unique ID:", &e.unique_id, w);
            kv_indent("Color mode:", e.color_mode, w);
            let modes: Vec<String> = e
                .supported_color_modes
                .iter()
                .map(ToString::to_string)
                .collect();
            kv_indent("Supported:", modes.join(", "), w);
        }
        None => kv("Entity:", "not available", w),
    }

    println!();
    println!("Config:");
    kv_indent("Name:", &config_summary.name, w);
    kv_indent("Fade:", format_args!("{} ms", config_summary.fade_ms), w);
    kv_indent("Gamma:", config_summary.gamma, w);

    Ok(())
}

pub(super) fn cmd_status(json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let light = match platform::open_light::<PlatformDevice>(&config) {
        Ok(light) => Some(light),
        Err(e) => {
            log::info!("{e}");
            None
        }
    };
    let device = light.as_ref().map(|l| l.device().info().clone());
    let entity = light.as_ref().map(collect_entity);
    print_status(device, entity, &config, json)
}
