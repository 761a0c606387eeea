//! Color values handled by the governance engine.
//!
//! A [`Color`] is an immutable sRGB hex string. Parsing is lenient about
//! the leading `#`, case and the 3-digit shorthand; anything else stays
//! stored verbatim so callers can see exactly what was rejected. Derived
//! components ([`Hct`], [`Oklch`]) are produced by the color primitives.

use serde::{Deserialize, Serialize};
use std::fmt;

/// sRGB color stored as `#RRGGBB` when parseable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub const WHITE_HEX: &'static str = "#FFFFFF";
    pub const BLACK_HEX: &'static str = "#000000";

    /// Wrap a hex string, normalizing it to uppercase `#RRGGBB` when it parses.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match parse_hex(&raw) {
            Some((r, g, b)) => Self::from_rgb8(r, g, b),
            None => Self(raw.trim().to_string()),
        }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self(format!("#{r:02X}{g:02X}{b:02X}"))
    }

    pub fn white() -> Self {
        Self(Self::WHITE_HEX.to_string())
    }

    pub fn black() -> Self {
        Self(Self::BLACK_HEX.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 8-bit channels, or `None` for unparseable input.
    pub fn rgb8(&self) -> Option<(u8, u8, u8)> {
        parse_hex(&self.0)
    }

    pub fn is_parseable(&self) -> bool {
        self.rgb8().is_some()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(raw: &str) -> Self {
        Color::new(raw)
    }
}

impl From<String> for Color {
    fn from(raw: String) -> Self {
        Color::new(raw)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// Hue/chroma/tone components. Tone is CIE L* in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hct {
    pub hue: f64,
    pub chroma: f64,
    pub tone: f64,
}

impl Hct {
    pub fn new(hue: f64, chroma: f64, tone: f64) -> Self {
        Self {
            hue: normalize_hue(hue),
            chroma: chroma.max(0.0),
            tone: tone.clamp(0.0, 100.0),
        }
    }

    pub fn with_tone(self, tone: f64) -> Self {
        Self::new(self.hue, self.chroma, tone)
    }

    pub fn with_chroma(self, chroma: f64) -> Self {
        Self::new(self.hue, chroma, self.tone)
    }
}

/// OKLCH components: lightness in `[0, 1]`, chroma, hue in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oklch {
    pub l: f64,
    pub c: f64,
    pub h: f64,
}

impl Oklch {
    /// Interpolate toward `other`, taking the shorter arc around the hue circle.
    pub fn mix(&self, other: &Oklch, t: f64) -> Oklch {
        let t = t.clamp(0.0, 1.0);
        let h = if self.c < 1e-6 {
            other.h
        } else if other.c < 1e-6 {
            self.h
        } else {
            let mut diff = other.h - self.h;
            if diff > 180.0 {
                diff -= 360.0;
            } else if diff < -180.0 {
                diff += 360.0;
            }
            normalize_hue(self.h + diff * t)
        };
        Oklch {
            l: self.l + (other.l - self.l) * t,
            c: self.c + (other.c - self.c) * t,
            h,
        }
    }
}

pub(crate) fn normalize_hue(h: f64) -> f64 {
    if !h.is_finite() {
        return 0.0;
    }
    let h = h % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

fn parse_hex(raw: &str) -> Option<(u8, u8, u8)> {
    let s = raw.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return None;
    }
    let bytes = s.as_bytes();

    match bytes.len() {
        3 => {
            let r = hex_digit(bytes[0])?;
            let g = hex_digit(bytes[1])?;
            let b = hex_digit(bytes[2])?;
            Some((r << 4 | r, g << 4 | g, b << 4 | b))
        }
        6 => Some((
            hex_byte(&bytes[0..2])?,
            hex_byte(&bytes[2..4])?,
            hex_byte(&bytes[4..6])?,
        )),
        _ => None,
    }
}

const fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn hex_byte(bytes: &[u8]) -> Option<u8> {
    Some(hex_digit(bytes[0])? << 4 | hex_digit(bytes[1])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_hex_forms() {
        assert_eq!(Color::new("#0a0f1a").as_str(), "#0A0F1A");
        assert_eq!(Color::new("0D9488").as_str(), "#0D9488");
        assert_eq!(Color::new("#fff").as_str(), "#FFFFFF");
        assert_eq!(Color::new("  #abc  ").rgb8(), Some((0xAA, 0xBB, 0xCC)));
    }

    #[test]
    fn unparseable_input_is_kept_verbatim() {
        let color = Color::new("not-a-color");
        assert!(!color.is_parseable());
        assert_eq!(color.as_str(), "not-a-color");
        assert!(Color::new("#12345").rgb8().is_none());
        assert!(Color::new("#gg0000").rgb8().is_none());
        assert!(Color::new("#ééé").rgb8().is_none());
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&Color::new("#0d9488")).unwrap();
        assert_eq!(json, "\"#0D9488\"");

        let parsed: Color = serde_json::from_str("\"#0d9488\"").unwrap();
        assert_eq!(parsed, Color::new("#0D9488"));
    }

    #[test]
    fn oklch_mix_takes_short_hue_arc() {
        let a = Oklch { l: 0.5, c: 0.1, h: 350.0 };
        let b = Oklch { l: 0.7, c: 0.1, h: 10.0 };
        let mid = a.mix(&b, 0.5);
        assert!((mid.l - 0.6).abs() < 1e-9);
        assert!(mid.h < 1e-9 || (mid.h - 360.0).abs() < 1e-9);
    }

    #[test]
    fn hct_clamps_components() {
        let hct = Hct::new(-30.0, -1.0, 140.0);
        assert_eq!(hct.hue, 330.0);
        assert_eq!(hct.chroma, 0.0);
        assert_eq!(hct.tone, 100.0);
    }
}
