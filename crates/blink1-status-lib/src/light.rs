//! Light entity: the blink(1) as an on/off, hue-saturation, dimmable light.
//!
//! The device has no state readback, so [`Blink1Light`] mirrors the last
//! commanded state and reports it back as an assumed state.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::color::{self, ColorCorrect, HsColor, Rgb};
use crate::config::Config;
use crate::device::StatusLightDevice;
use crate::error::Result;
use crate::offload::Offload;

pub const DEFAULT_NAME: &str = "Blink1";
pub const FALLBACK_UNIQUE_ID: &str = "blink1_status_light";
pub const DEFAULT_FADE_MS: u32 = 100;

/// Color modes a light entity can support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ColorMode {
    #[serde(rename = "onoff")]
    OnOff,
    #[serde(rename = "brightness")]
    Brightness,
    #[serde(rename = "hs")]
    Hs,
    #[serde(rename = "rgb")]
    Rgb,
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColorMode::OnOff => "onoff",
            ColorMode::Brightness => "brightness",
            ColorMode::Hs => "hs",
            ColorMode::Rgb => "rgb",
        };
        write!(f, "{s}")
    }
}

/// Optional attributes of a turn-on request. Absent fields keep the
/// previously commanded value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TurnOnParams {
    pub hs_color: Option<HsColor>,
    /// Requested brightness, clamped to `0..=255` when applied.
    pub brightness: Option<i32>,
}

impl TurnOnParams {
    pub fn hs(mut self, hs: HsColor) -> Self {
        self.hs_color = Some(hs);
        self
    }

    pub fn brightness(mut self, brightness: i32) -> Self {
        self.brightness = Some(brightness);
        self
    }
}

/// The host's light-entity interface.
pub trait LightEntity {
    fn name(&self) -> &str;
    fn unique_id(&self) -> &str;
    fn supported_color_modes(&self) -> BTreeSet<ColorMode>;
    fn color_mode(&self) -> ColorMode;
    /// `None` until the first command: the state is unknown.
    fn is_on(&self) -> Option<bool>;
    fn brightness(&self) -> u8;
    fn hs_color(&self) -> HsColor;
    fn turn_on(&mut self, params: TurnOnParams) -> Result<()>;
    fn turn_off(&mut self) -> Result<()>;

    /// Refresh state from the device. Nothing to fetch for assumed-state lights.
    fn update(&mut self) {}

    fn assumed_state(&self) -> bool {
        true
    }
}

/// blink(1) light entity.
pub struct Blink1Light<D, O> {
    device: Arc<D>,
    offload: O,
    name: String,
    unique_id: String,
    fade_ms: u32,
    correction: ColorCorrect,
    is_on: Option<bool>,
    // Last requested values, as given (unclamped).
    hs_color: HsColor,
    brightness: i32,
}

/// `blink1_<serial>`, or the fixed fallback id when no serial is available.
pub fn unique_id_for(device: &impl StatusLightDevice) -> String {
    match device.serial_number() {
        Ok(serial) => format!("blink1_{serial}"),
        Err(e) => {
            log::debug!("no device serial ({e}), using fixed unique id");
            FALLBACK_UNIQUE_ID.to_string()
        }
    }
}

impl<D, O> Blink1Light<D, O>
where
    D: StatusLightDevice + Send + Sync + 'static,
    O: Offload,
{
    pub fn new(device: D, offload: O) -> Self {
        let unique_id = unique_id_for(&device);
        Blink1Light {
            device: Arc::new(device),
            offload,
            name: DEFAULT_NAME.to_string(),
            unique_id,
            fade_ms: DEFAULT_FADE_MS,
            correction: ColorCorrect::default(),
            is_on: None,
            hs_color: HsColor::new(0.0, 0.0),
            brightness: i32::from(color::MAX_BRIGHTNESS),
        }
    }

    /// Build a light with name, fade time and gamma taken from `config`.
    pub fn from_config(device: D, offload: O, config: &Config) -> Self {
        Self::new(device, offload)
            .with_name(&config.name)
            .with_fade_ms(config.fade_ms)
            .with_correction(ColorCorrect::with_gamma(config.gamma))
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn with_fade_ms(mut self, fade_ms: u32) -> Self {
        self.fade_ms = fade_ms;
        self
    }

    pub fn with_correction(mut self, correction: ColorCorrect) -> Self {
        self.correction = correction;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn fade_ms(&self) -> u32 {
        self.fade_ms
    }

    /// RGB the current HS color and brightness map to, before gamma correction.
    pub fn target_rgb(&self) -> Rgb {
        let hs = self.hs_color.clamped();
        let brightness = color::clamp_brightness(self.brightness);
        color::hsv_to_rgb(hs.hue, hs.saturation, color::brightness_to_value(brightness))
    }

    fn send_color(&self, rgb: Rgb) -> Result<()> {
        let device = Arc::clone(&self.device);
        let correction = self.correction;
        let fade_ms = self.fade_ms;
        self.offload
            .run(move || device.fade_to_rgb_with(&correction, fade_ms, rgb))??;
        Ok(())
    }

    fn send_off(&self) -> Result<()> {
        let device = Arc::clone(&self.device);
        self.offload.run(move || device.off())??;
        Ok(())
    }
}

impl<D, O> LightEntity for Blink1Light<D, O>
where
    D: StatusLightDevice + Send + Sync + 'static,
    O: Offload,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn unique_id(&self) -> &str {
        &self.unique_id
    }

    fn supported_color_modes(&self) -> BTreeSet<ColorMode> {
        BTreeSet::from([ColorMode::Hs])
    }

    fn color_mode(&self) -> ColorMode {
        ColorMode::Hs
    }

    fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    fn brightness(&self) -> u8 {
        color::clamp_brightness(self.brightness)
    }

    fn hs_color(&self) -> HsColor {
        self.hs_color
    }

    fn turn_on(&mut self, params: TurnOnParams) -> Result<()> {
        if let Some(hs) = params.hs_color {
            self.hs_color = hs;
        }
        if let Some(brightness) = params.brightness {
            self.brightness = brightness;
        }

        let hs = self.hs_color.clamped();
        let brightness = color::clamp_brightness(self.brightness);
        self.is_on = Some(true);
        let rgb = self.target_rgb();

        match self.send_color(rgb) {
            Ok(()) => {
                log::debug!("Turned on light: HS={hs}, Brightness={brightness}");
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to turn on the light: {e}");
                Err(e)
            }
        }
    }

    fn turn_off(&mut self) -> Result<()> {
        self.is_on = Some(false);

        match self.send_off() {
            Ok(()) => {
                log::debug!("Turned off light.");
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to turn off the light: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;
    use crate::device::mock::MockDevice;
    use crate::offload::{Inline, WorkerThread};
    use crate::protocol::{CMD_FADE_TO_RGB, REPORT_ID};
    use crate::Blink1Error;

    fn light() -> Blink1Light<MockDevice, Inline> {
        Blink1Light::new(MockDevice::new(), Inline)
    }

    /// Light without gamma so reports carry the converted RGB directly.
    fn linear_light() -> Blink1Light<MockDevice, Inline> {
        light().with_correction(ColorCorrect::identity())
    }

    fn last_rgb(light: &Blink1Light<MockDevice, Inline>) -> [u8; 3] {
        let r = light.device().last_written().unwrap();
        [r[2], r[3], r[4]]
    }

    // ── metadata ──

    #[test]
    fn initial_state() {
        let l = light();
        assert_eq!(l.name(), "Blink1");
        assert_eq!(l.is_on(), None);
        assert_eq!(l.brightness(), 255);
        assert_eq!(l.hs_color(), HsColor::new(0.0, 0.0));
        assert!(l.assumed_state());
        assert!(l.device().written().is_empty());
    }

    #[test]
    fn unique_id_from_serial() {
        assert_eq!(light().unique_id(), "blink1_3A1C0F2D");
    }

    #[test]
    fn unique_id_fallback_without_serial() {
        let l = Blink1Light::new(MockDevice::with_serial(None), Inline);
        assert_eq!(l.unique_id(), "blink1_status_light");
    }

    #[test]
    fn color_modes_are_hs_only() {
        let l = light();
        assert_eq!(l.color_mode(), ColorMode::Hs);
        assert_eq!(l.supported_color_modes(), BTreeSet::from([ColorMode::Hs]));
    }

    #[test]
    fn color_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ColorMode::Hs).unwrap(), "hs");
        assert_eq!(serde_json::to_value(ColorMode::OnOff).unwrap(), "onoff");
        assert_eq!(ColorMode::Hs.to_string(), "hs");
    }

    #[test]
    fn from_config_applies_settings() {
        let config = Config {
            name: "Desk light".into(),
            fade_ms: 250,
            gamma: 1.0,
            ..Config::default()
        };
        let mut l = Blink1Light::from_config(MockDevice::new(), Inline, &config);
        assert_eq!(l.name(), "Desk light");
        assert_eq!(l.fade_ms(), 250);

        l.turn_on(TurnOnParams::default().hs(HsColor::new(0.0, 0.0)).brightness(128))
            .unwrap();
        let r = l.device().last_written().unwrap();
        // 250 ms → 25 ticks; gamma 1.0 leaves the grey level untouched
        assert_eq!(r[6], 25);
        assert_eq!([r[2], r[3], r[4]], [128, 128, 128]);
    }

    // ── turn_on ──

    #[test]
    fn turn_on_defaults_to_white() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default()).unwrap();
        assert_eq!(l.is_on(), Some(true));
        assert_eq!(
            l.device().last_written().unwrap(),
            [REPORT_ID, CMD_FADE_TO_RGB, 255, 255, 255, 0, 10, 0, 0]
        );
    }

    #[test]
    fn turn_on_with_hs_color() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default().hs(HsColor::new(240.0, 100.0)))
            .unwrap();
        assert_eq!(last_rgb(&l), [0, 0, 255]);
        assert_eq!(l.hs_color(), HsColor::new(240.0, 100.0));
    }

    #[test]
    fn turn_on_applies_gamma_by_default() {
        let mut l = light();
        l.turn_on(TurnOnParams::default().hs(HsColor::new(0.0, 50.0)))
            .unwrap();
        // HSV gives (255, 127, 127); gamma 2 → 127² / 255 ≈ 63
        assert_eq!(last_rgb(&l), [255, 63, 63]);
    }

    #[test]
    fn turn_on_partial_brightness_sends_exact_channels() {
        let mut l = linear_light();
        let cases = [
            (0.0, 0.0, 127, [127, 127, 127]),
            (0.0, 0.0, 15, [14, 14, 14]),
            (20.0, 100.0, 3, [3, 0, 0]),
            (220.0, 75.0, 2, [0, 0, 2]),
            (37.0, 64.0, 128, [128, 96, 46]),
            (200.0, 30.0, 77, [53, 69, 77]),
        ];
        for (h, s, b, want) in cases {
            l.turn_on(TurnOnParams::default().hs(HsColor::new(h, s)).brightness(b))
                .unwrap();
            assert_eq!(last_rgb(&l), want, "h={h} s={s} brightness={b}");
        }
    }

    #[test]
    fn turn_on_zero_brightness_is_black() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default().brightness(0)).unwrap();
        assert_eq!(last_rgb(&l), [0, 0, 0]);
        assert_eq!(l.is_on(), Some(true));
    }

    #[test]
    fn turn_on_keeps_previous_color_when_only_brightness_changes() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default().hs(HsColor::new(120.0, 100.0)))
            .unwrap();
        l.turn_on(TurnOnParams::default().brightness(255)).unwrap();
        assert_eq!(last_rgb(&l), [0, 255, 0]);
        assert_eq!(l.hs_color(), HsColor::new(120.0, 100.0));
    }

    #[test]
    fn turn_on_clamps_out_of_range_inputs() {
        let mut l = linear_light();
        l.turn_on(
            TurnOnParams::default()
                .hs(HsColor::new(400.0, 250.0))
                .brightness(1000),
        )
        .unwrap();
        // hue clamps to 360 (red), saturation to 100, brightness to 255
        assert_eq!(last_rgb(&l), [255, 0, 0]);
        assert_eq!(l.brightness(), 255);
    }

    #[test]
    fn turn_on_stores_raw_values() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default().hs(HsColor::new(-10.0, 50.0)))
            .unwrap();
        // The requested value is kept; clamping only applies to what is sent.
        assert_eq!(l.hs_color(), HsColor::new(-10.0, 50.0));
    }

    #[test]
    fn turn_on_negative_brightness_clamps_to_zero() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default().brightness(-40)).unwrap();
        assert_eq!(l.brightness(), 0);
        assert_eq!(last_rgb(&l), [0, 0, 0]);
    }

    #[test]
    fn turn_on_failure_still_marks_on() {
        let mut l = light();
        l.device().set_fail_writes(true);
        let err = l.turn_on(TurnOnParams::default()).unwrap_err();
        assert!(matches!(err, Blink1Error::Device(DeviceError::WriteFailed(_))));
        assert_eq!(l.is_on(), Some(true));
    }

    // ── turn_off ──

    #[test]
    fn turn_off_sends_off() {
        let mut l = light();
        l.turn_on(TurnOnParams::default()).unwrap();
        l.turn_off().unwrap();
        assert_eq!(l.is_on(), Some(false));
        assert_eq!(
            l.device().last_written().unwrap(),
            [REPORT_ID, CMD_FADE_TO_RGB, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn turn_off_keeps_color_for_next_turn_on() {
        let mut l = linear_light();
        l.turn_on(TurnOnParams::default().hs(HsColor::new(180.0, 100.0)))
            .unwrap();
        l.turn_off().unwrap();
        l.turn_on(TurnOnParams::default()).unwrap();
        assert_eq!(last_rgb(&l), [0, 255, 255]);
    }

    #[test]
    fn turn_off_failure_still_marks_off() {
        let mut l = light();
        l.device().set_fail_writes(true);
        assert!(l.turn_off().is_err());
        assert_eq!(l.is_on(), Some(false));
    }

    #[test]
    fn update_is_noop() {
        let mut l = light();
        l.update();
        assert!(l.device().written().is_empty());
        assert_eq!(l.is_on(), None);
    }

    // ── offload ──

    #[test]
    fn worker_offload_reaches_device() {
        let mut l = Blink1Light::new(MockDevice::new(), WorkerThread::with_defaults());
        l.turn_on(TurnOnParams::default().hs(HsColor::new(0.0, 100.0)))
            .unwrap();
        l.turn_off().unwrap();
        assert_eq!(l.device().written().len(), 2);
    }

    #[test]
    fn target_rgb_tracks_state() {
        let mut l = linear_light();
        assert_eq!(l.target_rgb(), Rgb::new(255, 255, 255));
        l.turn_on(TurnOnParams::default().hs(HsColor::new(0.0, 100.0)))
            .unwrap();
        assert_eq!(l.target_rgb(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn usable_as_trait_object() {
        let mut entity: Box<dyn LightEntity> = Box::new(light());
        entity.turn_on(TurnOnParams::default()).unwrap();
        assert_eq!(entity.is_on(), Some(true));
    }
}
