//! `config` subcommand: show current configuration and file path.

use std::path::Path;

use super::{Config, ConfigOutput, Result, kv, kv_indent, kv_width, load_config, print_json};

pub(super) fn cmd_config(json: bool, init: bool, custom_path: Option<&Path>) -> Result<()> {
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);

    if init && let Some(path) = &config_path {
        if path.exists() {
            log::warn!("{} already exists, not overwriting", path.display());
        } else {
            Config::default().save_to(path)?;
            log::info!("wrote default config to {}", path.display());
        }
    }

    let config = load_config(custom_path);
    let config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if json {
        return print_json(&ConfigOutput {
            config_file: config_path.as_ref().map(|p| p.display().to_string()),
            config_file_exists: config_exists,
            settings: config,
        });
    }

    let w = kv_width(
        &["Config file:"],
        &["name:", "fade_ms:", "gamma:", "offload_timeout_ms:"],
    );

    match &config_path {
        Some(p) if config_exists => kv("Config file:", format_args!("{} (loaded)", p.display()), w),
        Some(p) => kv(
            "Config file:",
            format_args!("{} (not found, using defaults)", p.display()),
            w,
        ),
        None => kv("Config file:", "(no config directory)", w),
    }
    println!();

    println!("Settings:");
    kv_indent("name:", &config.name, w);
    kv_indent("fade_ms:", config.fade_ms, w);
    kv_indent("gamma:", config.gamma, w);
    kv_indent("offload_timeout_ms:", config.offload_timeout_ms, w);

    if let Err(errors) = config.validate() {
        println!();
        println!("Problems:");
        for e in errors {
            println!("  {e}");
        }
    }
    Ok(())
}
