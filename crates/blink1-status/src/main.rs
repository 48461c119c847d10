//! blink1-status: command-line control for the blink(1) USB notification light.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

mod cli;

#[derive(Parser)]
#[command(
    name = "blink1-status",
    version,
    about = "Control a blink(1) USB notification light as an HS-color light"
)]
struct Args {
    /// Output as JSON (for on, off, status, config)
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(args.verbose)),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    if let Err(e) = cli::run(args.command, args.json, args.config.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(2), "debug");
        assert_eq!(log_filter(9), "debug");
    }

    #[test]
    fn args_parse_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["blink1-status", "status", "--json", "-vv"]).unwrap();
        assert!(args.json);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn args_parse_config_path() {
        let args =
            Args::try_parse_from(["blink1-status", "--config", "/tmp/b1.toml", "off"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/b1.toml")));
    }

    #[test]
    fn args_parse_negative_brightness() {
        let args =
            Args::try_parse_from(["blink1-status", "on", "--brightness", "-20"]).unwrap();
        assert!(matches!(
            args.command,
            cli::Command::On {
                brightness: Some(-20),
                ..
            }
        ));
    }
}
