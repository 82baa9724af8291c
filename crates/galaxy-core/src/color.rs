//! RGB triples with hex parsing, sRGB decoding and interpolation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error produced when a `#rrggbb` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color `{0}` (expected #rrggbb)")]
pub struct ParseColorError(pub String);

/// An RGB color with each channel in `[0, 1]`.
///
/// Values parsed from hex are sRGB-encoded; [`Rgb::to_linear`] decodes them
/// into the working space used for blending. Serialized as a `#rrggbb` string so config files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ParseColorError> {
        let digits = hex.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(ParseColorError(hex.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| f32::from(v) / 255.0)
                .map_err(|_| ParseColorError(hex.to_string()))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Format as lowercase `#rrggbb`, rounding each channel to 8 bits.
    pub fn to_hex(self) -> String {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", q(self.r), q(self.g), q(self.b))
    }

    /// Linear interpolation: `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Decode sRGB-encoded channels into linear light.
    pub fn to_linear(self) -> Rgb {
        Rgb::new(
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        )
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// sRGB transfer function inverse.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_default_inside_color() {
        let c = Rgb::from_hex("#ff6030").unwrap();
        assert_eq!(c.r, 1.0);
        assert!((c.g - 96.0 / 255.0).abs() < 1e-6);
        assert!((c.b - 48.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_parse_without_hash() {
        assert_eq!(Rgb::from_hex("000000").unwrap(), Rgb::BLACK);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in ["", "#fff", "#gg0000", "#1234567", "#ff60é0"] {
            assert!(Rgb::from_hex(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_hex_roundtrip() {
        for hex in ["#ff6030", "#1b3984", "#000000", "#ffffff"] {
            assert_eq!(Rgb::from_hex(hex).unwrap().to_hex(), hex);
        }
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let a = Rgb::new(1.0, 0.0, 0.5);
        let b = Rgb::new(0.0, 1.0, 0.5);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        let mid = a.lerp(b, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
        assert!((mid.g - 0.5).abs() < 1e-6);
        assert!((mid.b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_srgb_to_linear_endpoints() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        assert!(srgb_to_linear(0.04) < 0.004);
    }

    #[test]
    fn test_to_linear_keeps_black_and_white() {
        assert_eq!(Rgb::BLACK.to_linear(), Rgb::BLACK);
        let w = Rgb::WHITE.to_linear();
        assert!((w.r - 1.0).abs() < 1e-6 && (w.g - 1.0).abs() < 1e-6 && (w.b - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_linear_darkens_mid_tones() {
        // #808080 is about 21.6% linear light.
        let grey = Rgb::from_hex("#808080").unwrap().to_linear();
        assert!((grey.r - 0.2158).abs() < 1e-3, "{}", grey.r);
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let c = Rgb::from_hex("#1b3984").unwrap();
        let s = ron::to_string(&c).unwrap();
        assert_eq!(s, "\"#1b3984\"");
        let back: Rgb = ron::from_str(&s).unwrap();
        assert_eq!(back.to_hex(), "#1b3984");
    }
}
