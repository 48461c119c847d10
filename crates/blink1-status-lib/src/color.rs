//! Color math: HS/brightness to RGB, color correction, parsing and formatting.
//!
//! Hue is in degrees (`0..=360`), saturation in percent (`0..=100`) and
//! brightness on the light-entity scale (`0..=255`).

use serde::Serialize;

/// 8-bit RGB triple as sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// Hue/saturation color of the light-entity model.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HsColor {
    /// Hue in degrees.
    pub hue: f64,
    /// Saturation in percent.
    pub saturation: f64,
}

pub const MAX_HUE: f64 = 360.0;
pub const MAX_SATURATION: f64 = 100.0;
pub const MAX_BRIGHTNESS: u8 = 255;

fn clamp_or_zero(v: f64, max: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, max) }
}

impl HsColor {
    pub const fn new(hue: f64, saturation: f64) -> Self {
        HsColor { hue, saturation }
    }

    /// Clamp hue into `[0, 360]` and saturation into `[0, 100]`.
    ///
    /// Out-of-range hues are clamped, not wrapped. NaN components become 0.
    pub fn clamped(self) -> Self {
        HsColor {
            hue: clamp_or_zero(self.hue, MAX_HUE),
            saturation: clamp_or_zero(self.saturation, MAX_SATURATION),
        }
    }
}

impl std::fmt::Display for HsColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.hue, self.saturation)
    }
}

/// Clamp a requested brightness into `[0, 255]`.
pub fn clamp_brightness(value: i32) -> u8 {
    value.clamp(0, i32::from(MAX_BRIGHTNESS)) as u8
}

/// Brightness (`0..=255`) as an HSV value percentage (`0..=100`).
pub fn brightness_to_value(brightness: u8) -> f64 {
    f64::from(brightness) / f64::from(MAX_BRIGHTNESS) * 100.0
}

/// Convert HSV to RGB.
///
/// `h` is in degrees (`0..=360`), `s` and `v` in percent (`0..=100`).
/// Everything is scaled to `0..=1` first and the sector is taken from
/// `h * 6`, so results match the usual `colorsys`-based conversion bit for
/// bit. Channels are truncated (not rounded) to 8 bits; `h = 360` is red.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Rgb {
    let h = h / 360.0;
    let s = s / 100.0;
    let v = v / 100.0;

    let (r, g, b) = if s == 0.0 {
        (v, v, v)
    } else {
        let h6 = h * 6.0;
        let i = h6.trunc();
        let f = h6 - i;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match (i as i64).rem_euclid(6) {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        }
    };

    let to_byte = |c: f64| (c * 255.0).clamp(0.0, 255.0) as u8;
    Rgb::new(to_byte(r), to_byte(g), to_byte(b))
}

/// Convert RGB to an HS color plus entity brightness (the max channel).
pub fn rgb_to_hs(rgb: Rgb) -> (HsColor, u8) {
    let r = f64::from(rgb.r);
    let g = f64::from(rgb.g);
    let b = f64::from(rgb.b);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let brightness = rgb.r.max(rgb.g).max(rgb.b);

    if delta == 0.0 {
        return (HsColor::new(0.0, 0.0), brightness);
    }

    let hue = if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = delta / max * 100.0;
    (HsColor::new(hue, saturation), brightness)
}

/// Per-channel gamma and white-point correction applied before colors hit
/// the LEDs, so perceived brightness tracks the requested value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCorrect {
    pub gamma: [f32; 3],
    pub white_point: Rgb,
}

pub const DEFAULT_GAMMA: f32 = 2.0;

impl Default for ColorCorrect {
    fn default() -> Self {
        Self::with_gamma(DEFAULT_GAMMA)
    }
}

impl ColorCorrect {
    /// Same gamma on all channels, white point at full scale.
    pub fn with_gamma(gamma: f32) -> Self {
        ColorCorrect {
            gamma: [gamma; 3],
            white_point: Rgb::new(255, 255, 255),
        }
    }

    /// No correction at all.
    pub fn identity() -> Self {
        Self::with_gamma(1.0)
    }

    /// `round(white * (c / 255) ^ gamma)` per channel.
    pub fn apply(&self, rgb: Rgb) -> Rgb {
        let correct = |c: u8, gamma: f32, white: u8| {
            let lum = f64::from(c) / 255.0;
            (f64::from(white) * lum.powf(f64::from(gamma)))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            correct(rgb.r, self.gamma[0], self.white_point.r),
            correct(rgb.g, self.gamma[1], self.white_point.g),
            correct(rgb.b, self.gamma[2], self.white_point.b),
        )
    }
}

/// Parse a color string.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`, `"purple"`, `"cyan"`
pub fn parse_color(s: &str) -> crate::error::Result<Rgb> {
    let s = s.trim();

    match s.to_lowercase().as_str() {
        "red" => return Ok(Rgb::new(0xFF, 0x00, 0x00)),
        "green" => return Ok(Rgb::new(0x00, 0xFF, 0x00)),
        "blue" => return Ok(Rgb::new(0x00, 0x00, 0xFF)),
        "white" => return Ok(Rgb::new(0xFF, 0xFF, 0xFF)),
        "orange" => return Ok(Rgb::new(0xFF, 0x80, 0x00)),
        "yellow" => return Ok(Rgb::new(0xFF, 0xFF, 0x00)),
        "purple" => return Ok(Rgb::new(0x80, 0x00, 0xFF)),
        "cyan" => return Ok(Rgb::new(0x00, 0xFF, 0xFF)),
        "off" | "black" => return Ok(Rgb::BLACK),
        _ => {}
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return Err(crate::Blink1Error::Color(format!(
            "Invalid color: {s} (use #RRGGBB or a color name)"
        )));
    }
    let val = u32::from_str_radix(hex, 16)
        .map_err(|_| crate::Blink1Error::Color(format!("Invalid hex color: {s}")))?;
    let [_, r, g, b] = val.to_be_bytes();
    Ok(Rgb::new(r, g, b))
}

/// Format a color as `#RRGGBB`.
pub fn format_color(rgb: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb.r, rgb.g, rgb.b)
}
