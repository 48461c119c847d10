//! Platform setup: open the device and register its light entity with a host.
//!
//! A failed open is reported through the log and a `false` return; the host
//! keeps running without the entity.

use crate::config::Config;
use crate::device::{PlatformDevice, StatusLightDevice};
use crate::light::{Blink1Light, LightEntity};
use crate::offload::WorkerThread;

/// Open a device of type `D` and wrap it in a light configured from `config`.
pub fn open_light<D>(config: &Config) -> crate::error::Result<Blink1Light<D, WorkerThread>>
where
    D: StatusLightDevice + Send + Sync + 'static,
{
    let device = D::open()?;
    Ok(Blink1Light::from_config(
        device,
        WorkerThread::new(config.offload_timeout()),
        config,
    ))
}

/// Set up the blink(1) light on the platform device backend.
pub fn setup_platform(
    config: &Config,
    add_entities: impl FnOnce(Vec<Box<dyn LightEntity>>),
) -> bool {
    setup_platform_with::<PlatformDevice>(config, add_entities)
}

/// Set up the light using device type `D`.
///
/// Hands the entity to `add_entities` and returns `true` on success.
pub fn setup_platform_with<D>(
    config: &Config,
    add_entities: impl FnOnce(Vec<Box<dyn LightEntity>>),
) -> bool
where
    D: StatusLightDevice + Send + Sync + 'static,
{
    match open_light::<D>(config) {
        Ok(light) => {
            add_entities(vec![Box::new(light)]);
            log::info!("Blink(1) device initialized successfully");
            true
        }
        Err(e) => {
            log::error!("Failed to initialize Blink(1) device: {e}");
            log::error!(
                "Please ensure the Blink(1) device is connected and you have the proper USB permissions"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::mock::{MissingDevice, MockDevice};
    use crate::light::TurnOnParams;
    use std::sync::Mutex;

    /// Logger that keeps every record so tests can look for specific lines.
    struct CaptureLog {
        lines: Mutex<Vec<(log::Level, String)>>,
    }

    impl log::Log for CaptureLog {
        fn enabled(&self, _: &log::Metadata) -> bool {
            true
        }
        fn log(&self, record: &log::Record) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }
        fn flush(&self) {}
    }

    static CAPTURE: CaptureLog = CaptureLog {
        lines: Mutex::new(Vec::new()),
    };

    /// Error lines logged so far by any test in this binary.
    fn captured_errors() -> Vec<String> {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);
        CAPTURE
            .lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == log::Level::Error)
            .map(|(_, line)| line.clone())
            .collect()
    }

    fn assert_setup_failure_logged(errors: &[String]) {
        assert!(
            errors
                .iter()
                .any(|l| l.starts_with("Failed to initialize Blink(1) device: "))
        );
        assert!(errors.iter().any(|l| l.contains("proper USB permissions")));
    }

    #[test]
    fn setup_adds_one_entity() {
        let mut entities = Vec::new();
        let ok = setup_platform_with::<MockDevice>(&Config::default(), |e| entities.extend(e));
        assert!(ok);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name(), "Blink1");
        assert_eq!(entities[0].unique_id(), "blink1_3A1C0F2D");
    }

    #[test]
    fn setup_failure_adds_nothing() {
        let mut called = false;
        let ok = setup_platform_with::<MissingDevice>(&Config::default(), |_| called = true);
        assert!(!ok);
        assert!(!called);
    }

    #[test]
    fn setup_failure_logs_error_and_hint() {
        captured_errors();
        assert!(!setup_platform_with::<MissingDevice>(&Config::default(), |_| {}));
        assert_setup_failure_logged(&captured_errors());
    }

    #[test]
    fn platform_device_setup_reports_outcome() {
        captured_errors();
        let mut added = 0;
        let ok = setup_platform(&Config::default(), |e| added = e.len());
        // Without a blink(1) attached this is the failure path.
        assert_eq!(ok, added == 1);
        if !ok {
            assert_eq!(added, 0);
            assert_setup_failure_logged(&captured_errors());
        }
    }

    #[test]
    fn setup_uses_configured_name() {
        let config = Config {
            name: "Build status".into(),
            ..Config::default()
        };
        let mut entities = Vec::new();
        setup_platform_with::<MockDevice>(&config, |e| entities.extend(e));
        assert_eq!(entities[0].name(), "Build status");
    }

    #[test]
    fn registered_entity_is_controllable() {
        let mut entities = Vec::new();
        setup_platform_with::<MockDevice>(&Config::default(), |e| entities.extend(e));
        let light = &mut entities[0];
        light.turn_on(TurnOnParams::default().brightness(10)).unwrap();
        assert_eq!(light.is_on(), Some(true));
        light.turn_off().unwrap();
        assert_eq!(light.is_on(), Some(false));
    }

    #[test]
    fn open_light_propagates_open_error() {
        let err = open_light::<MissingDevice>(&Config::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "blink(1) device not found");
    }
}
