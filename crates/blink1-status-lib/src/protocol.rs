//! Protocol constants for the blink(1) USB notification light.
//!
//! The device speaks plain HID: every command is a single 8-byte feature
//! report (report id 1), sent with a class SET_REPORT control transfer.
//! Responses are read back with GET_REPORT on the same report id.

// ── USB identity ──

/// ThingM vendor id.
pub const BLINK1_VID: u16 = 0x27B8;

/// blink(1) product id (shared by mk1, mk2 and mk3).
pub const BLINK1_PID: u16 = 0x01ED;

/// HID interface number.
pub const HID_INTERFACE: u8 = 0;

// ── HID framing ──

/// Feature report id used for all commands.
pub const REPORT_ID: u8 = 1;

/// Report length including the leading report id byte.
pub const REPORT_SIZE: usize = 9;

/// HID class request: SET_REPORT.
pub const HID_SET_REPORT: u8 = 0x09;

/// HID class request: GET_REPORT.
pub const HID_GET_REPORT: u8 = 0x01;

/// HID report type "feature", placed in the high byte of wValue.
pub const HID_REPORT_TYPE_FEATURE: u16 = 0x03;

/// wValue for feature report [`REPORT_ID`].
pub const FEATURE_REPORT_VALUE: u16 = (HID_REPORT_TYPE_FEATURE << 8) | REPORT_ID as u16;

/// Control transfer timeout.
pub const USB_TIMEOUT_MS: u64 = 1000;

// ── Commands ──

/// Fade to RGB: `['c', r, g, b, th, tl, led, 0]`.
pub const CMD_FADE_TO_RGB: u8 = b'c';

/// Get firmware version: response carries ASCII major/minor at bytes 3 and 4.
pub const CMD_GET_VERSION: u8 = b'v';

/// LED number addressing every LED on the device.
pub const LED_ALL: u8 = 0;

/// Fade time resolution: one tick is 10 ms on the wire.
pub const FADE_TICK_MS: u32 = 10;

/// Build a fade-to-RGB feature report.
///
/// Fade time is sent in 10 ms ticks as a big-endian u16; longer fades
/// saturate at the maximum tick count.
pub fn build_fade_report(fade_ms: u32, r: u8, g: u8, b: u8, led: u8) -> [u8; REPORT_SIZE] {
    let ticks = (fade_ms / FADE_TICK_MS).min(u32::from(u16::MAX)) as u16;
    let [th, tl] = ticks.to_be_bytes();
    [REPORT_ID, CMD_FADE_TO_RGB, r, g, b, th, tl, led, 0]
}

/// Build a get-version feature report.
pub fn build_version_report() -> [u8; REPORT_SIZE] {
    [REPORT_ID, CMD_GET_VERSION, 0, 0, 0, 0, 0, 0, 0]
}

/// Parse a version response into `major * 100 + minor`.
///
/// Returns `None` for short responses or non-digit version bytes.
pub fn parse_version(report: &[u8]) -> Option<u16> {
    let major = report.get(3).copied()?;
    let minor = report.get(4).copied()?;
    if !major.is_ascii_digit() || !minor.is_ascii_digit() {
        return None;
    }
    Some(u16::from(major - b'0') * 100 + u16::from(minor - b'0'))
}
