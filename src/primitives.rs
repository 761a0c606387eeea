//! Primitive color service consumed by the governance engine.
//!
//! [`ColorPrimitives`] is the seam the engine calls through: color-space
//! conversion, raw APCA contrast, the tone search used by remediation, and
//! background mode detection. [`StandardPrimitives`] is the stock
//! implementation:
//!
//! - hue/chroma/tone is modelled with CIE LCh(ab) under D65. Tone is CIE L*,
//!   the same tone axis HCT uses; hue and chroma are the Lab polar components.
//! - OKLCH follows Björn Ottosson's reference matrices.
//! - contrast is APCA 0.0.98G-4g (SAPC constants), reported in Lc units.
//!
//! Derived hue/chroma/tone values are cached per color. A color always maps
//! to the same components, so the cache is write-once per key and a race
//! only costs a duplicate computation.

use crate::color::{normalize_hue, Color, Hct, Oklch};
use crate::decision::ContrastSample;
use crate::errors::{SafeReadLock, SafeWriteLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Which kind of content reads best on a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    /// Dark background: light text and icons.
    LightContent,
    /// Light background: dark text and icons.
    DarkContent,
}

impl BackgroundMode {
    pub fn prefers_dark(&self) -> bool {
        matches!(self, BackgroundMode::DarkContent)
    }
}

/// Outcome of a tone search against one background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneSearchResult {
    pub color: Color,
    pub achieved_score: f64,
    /// Whether `achieved_score` reached the requested minimum.
    pub reached: bool,
}

/// Contract between the engine and whatever does the color math.
pub trait ColorPrimitives: Send + Sync {
    /// `None` when the color cannot be parsed.
    fn to_hct(&self, color: &Color) -> Option<Hct>;

    /// Gamut-clamped to sRGB by reducing chroma.
    fn from_hct(&self, hct: Hct) -> Color;

    fn to_oklch(&self, color: &Color) -> Option<Oklch>;

    fn from_oklch(&self, oklch: Oklch) -> Color;

    /// Signed APCA contrast of `foreground` on `background`.
    fn contrast_score(&self, foreground: &Color, background: &Color) -> ContrastSample;

    /// Search the tone axis for a color reaching `min_score` on `background`.
    ///
    /// The preferred direction (toward black when `prefer_dark`) is tried
    /// first, then the opposite one. `tint` fixes hue and chroma of the
    /// candidates; `None` searches neutral grays.
    fn optimal_color_for_score(
        &self,
        background: &Color,
        min_score: f64,
        prefer_dark: bool,
        tint: Option<Hct>,
    ) -> ToneSearchResult;

    fn detect_background_mode(&self, background: &Color) -> BackgroundMode;
}

// SAPC / APCA 0.0.98G-4g constants
const MAIN_TRC: f64 = 2.4;
const R_CO: f64 = 0.212_672_9;
const G_CO: f64 = 0.715_152_2;
const B_CO: f64 = 0.072_175_0;
const NORM_BG: f64 = 0.56;
const NORM_TXT: f64 = 0.57;
const REV_TXT: f64 = 0.62;
const REV_BG: f64 = 0.65;
const BLK_THRS: f64 = 0.022;
const BLK_CLMP: f64 = 1.414;
const SCALE_BOW: f64 = 1.14;
const SCALE_WOB: f64 = 1.14;
const LO_BOW_OFFSET: f64 = 0.027;
const LO_WOB_OFFSET: f64 = 0.027;
const DELTA_Y_MIN: f64 = 0.0005;
const LO_CLIP: f64 = 0.1;

// D65 reference white
const WHITE_X: f64 = 0.950_47;
const WHITE_Y: f64 = 1.0;
const WHITE_Z: f64 = 1.088_83;

const GAMUT_EPSILON: f64 = 1e-7;
const GAMUT_ITERATIONS: usize = 24;

/// Stock primitive service with a shared derivation cache.
#[derive(Debug, Default)]
pub struct StandardPrimitives {
    hct_cache: RwLock<HashMap<Color, Option<Hct>>>,
}

impl StandardPrimitives {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of colors whose components have been cached.
    pub fn cached_colors(&self) -> usize {
        self.hct_cache
            .safe_read("hct_cache")
            .map(|cache| cache.len())
            .unwrap_or(0)
    }

    fn derive_hct(color: &Color) -> Option<Hct> {
        let (r, g, b) = color.rgb8()?;
        let (l, a, b_lab) = linear_srgb_to_lab(
            srgb_to_linear(channel(r)),
            srgb_to_linear(channel(g)),
            srgb_to_linear(channel(b)),
        );
        let chroma = a.hypot(b_lab);
        let hue = if chroma < 1e-8 {
            0.0
        } else {
            normalize_hue(b_lab.atan2(a).to_degrees())
        };
        Some(Hct::new(hue, chroma, l))
    }

    /// Walk the tone axis from one pole inward.
    ///
    /// Scores fall monotonically as the candidate approaches the background
    /// tone, so the walk stops at the first failing tone and keeps the last
    /// passing one: the least extreme color that still clears `min_score`.
    fn search_direction(
        &self,
        background: &Color,
        min_score: f64,
        toward_dark: bool,
        tint: Hct,
    ) -> ToneSearchResult {
        let mut passing: Option<(Color, f64)> = None;
        let mut pole: Option<(Color, f64)> = None;

        for step in 0..=100u32 {
            let tone = if toward_dark {
                f64::from(step)
            } else {
                100.0 - f64::from(step)
            };
            let candidate = self.from_hct(tint.with_tone(tone));
            let score = self.contrast_score(&candidate, background).absolute_score;

            if pole.is_none() {
                pole = Some((candidate.clone(), score));
            }
            if score >= min_score {
                passing = Some((candidate, score));
            } else {
                break;
            }
        }

        match (passing, pole) {
            (Some((color, score)), _) => ToneSearchResult {
                color,
                achieved_score: score,
                reached: true,
            },
            (None, Some((color, score))) => ToneSearchResult {
                color,
                achieved_score: score,
                reached: false,
            },
            (None, None) => ToneSearchResult {
                color: if toward_dark { Color::black() } else { Color::white() },
                achieved_score: 0.0,
                reached: false,
            },
        }
    }
}

impl ColorPrimitives for StandardPrimitives {
    fn to_hct(&self, color: &Color) -> Option<Hct> {
        if let Ok(cache) = self.hct_cache.safe_read("hct_cache") {
            if let Some(hit) = cache.get(color) {
                return *hit;
            }
        }

        let derived = Self::derive_hct(color);
        if let Ok(mut cache) = self.hct_cache.safe_write("hct_cache") {
            cache.entry(color.clone()).or_insert(derived);
        }
        derived
    }

    fn from_hct(&self, hct: Hct) -> Color {
        let hct = Hct::new(hct.hue, hct.chroma, hct.tone);
        let rgb = |chroma: f64| {
            let h = hct.hue.to_radians();
            lab_to_linear_srgb(hct.tone, chroma * h.cos(), chroma * h.sin())
        };
        let linear = clamp_chroma(hct.chroma, rgb);
        to_color(linear)
    }

    fn to_oklch(&self, color: &Color) -> Option<Oklch> {
        let (r, g, b) = color.rgb8()?;
        let (l, a, b_ok) = linear_srgb_to_oklab(
            srgb_to_linear(channel(r)),
            srgb_to_linear(channel(g)),
            srgb_to_linear(channel(b)),
        );
        let c = a.hypot(b_ok);
        let h = if c < 1e-8 {
            0.0
        } else {
            normalize_hue(b_ok.atan2(a).to_degrees())
        };
        Some(Oklch { l, c, h })
    }

    fn from_oklch(&self, oklch: Oklch) -> Color {
        let l = oklch.l.clamp(0.0, 1.0);
        let rgb = |chroma: f64| {
            let h = oklch.h.to_radians();
            oklab_to_linear_srgb(l, chroma * h.cos(), chroma * h.sin())
        };
        let linear = clamp_chroma(oklch.c.max(0.0), rgb);
        to_color(linear)
    }

    fn contrast_score(&self, foreground: &Color, background: &Color) -> ContrastSample {
        let raw_score = match (foreground.rgb8(), background.rgb8()) {
            (Some(fg), Some(bg)) => apca_contrast(screen_luminance(fg), screen_luminance(bg)),
            _ => 0.0,
        };
        ContrastSample::new(foreground.clone(), background.clone(), raw_score)
    }

    fn optimal_color_for_score(
        &self,
        background: &Color,
        min_score: f64,
        prefer_dark: bool,
        tint: Option<Hct>,
    ) -> ToneSearchResult {
        let tint = tint.unwrap_or_else(|| Hct::new(0.0, 0.0, 50.0));

        let preferred = self.search_direction(background, min_score, prefer_dark, tint);
        if preferred.reached {
            return preferred;
        }
        let opposite = self.search_direction(background, min_score, !prefer_dark, tint);
        if opposite.reached || opposite.achieved_score > preferred.achieved_score {
            opposite
        } else {
            preferred
        }
    }

    fn detect_background_mode(&self, background: &Color) -> BackgroundMode {
        let on_white = self.contrast_score(&Color::white(), background).absolute_score;
        let on_black = self.contrast_score(&Color::black(), background).absolute_score;
        if on_white >= on_black {
            BackgroundMode::LightContent
        } else {
            BackgroundMode::DarkContent
        }
    }
}

/// APCA screen luminance: simple 2.4 exponent, no piecewise sRGB segment.
fn screen_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    R_CO * channel(r).powf(MAIN_TRC)
        + G_CO * channel(g).powf(MAIN_TRC)
        + B_CO * channel(b).powf(MAIN_TRC)
}

/// Signed Lc. Positive for dark text on light backgrounds.
fn apca_contrast(text_y: f64, background_y: f64) -> f64 {
    let soft_clamp = |y: f64| {
        if y > BLK_THRS {
            y
        } else {
            y + (BLK_THRS - y).powf(BLK_CLMP)
        }
    };
    let text_y = soft_clamp(text_y);
    let background_y = soft_clamp(background_y);

    if (background_y - text_y).abs() < DELTA_Y_MIN {
        return 0.0;
    }

    let output = if background_y > text_y {
        let sapc = (background_y.powf(NORM_BG) - text_y.powf(NORM_TXT)) * SCALE_BOW;
        if sapc < LO_CLIP {
            0.0
        } else {
            sapc - LO_BOW_OFFSET
        }
    } else {
        let sapc = (background_y.powf(REV_BG) - text_y.powf(REV_TXT)) * SCALE_WOB;
        if sapc > -LO_CLIP {
            0.0
        } else {
            sapc + LO_WOB_OFFSET
        }
    };
    output * 100.0
}

/// Largest chroma in `[0, chroma]` whose linear sRGB stays in gamut.
fn clamp_chroma<F>(chroma: f64, rgb: F) -> (f64, f64, f64)
where
    F: Fn(f64) -> (f64, f64, f64),
{
    let initial = rgb(chroma);
    if in_gamut(initial) {
        return initial;
    }

    let mut lo = 0.0;
    let mut hi = chroma;
    for _ in 0..GAMUT_ITERATIONS {
        let mid = (lo + hi) * 0.5;
        if in_gamut(rgb(mid)) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    rgb(lo)
}

fn in_gamut((r, g, b): (f64, f64, f64)) -> bool {
    let ok = |v: f64| v.is_finite() && (-GAMUT_EPSILON..=1.0 + GAMUT_EPSILON).contains(&v);
    ok(r) && ok(g) && ok(b)
}

fn to_color((r, g, b): (f64, f64, f64)) -> Color {
    Color::from_rgb8(
        to_u8(linear_to_srgb(r)),
        to_u8(linear_to_srgb(g)),
        to_u8(linear_to_srgb(b)),
    )
}

fn channel(v: u8) -> f64 {
    f64::from(v) / 255.0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.040_45 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

// ─── CIE Lab ────────────────────────────────────────────────────────────────

const LAB_EPSILON: f64 = 216.0 / 24_389.0;
const LAB_DELTA: f64 = 6.0 / 29.0;

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        t / (3.0 * LAB_DELTA * LAB_DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    if t > LAB_DELTA {
        t * t * t
    } else {
        3.0 * LAB_DELTA * LAB_DELTA * (t - 4.0 / 29.0)
    }
}

fn linear_srgb_to_lab(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let x = 0.412_456_4 * r + 0.357_576_1 * g + 0.180_437_5 * b;
    let y = 0.212_672_9 * r + 0.715_152_2 * g + 0.072_175_0 * b;
    let z = 0.019_333_9 * r + 0.119_192_0 * g + 0.950_304_1 * b;

    let fx = lab_f(x / WHITE_X);
    let fy = lab_f(y / WHITE_Y);
    let fz = lab_f(z / WHITE_Z);

    (116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

fn lab_to_linear_srgb(l: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = WHITE_X * lab_f_inv(fx);
    let y = WHITE_Y * lab_f_inv(fy);
    let z = WHITE_Z * lab_f_inv(fz);

    (
        3.240_454_2 * x - 1.537_138_5 * y - 0.498_531_4 * z,
        -0.969_266_0 * x + 1.876_010_8 * y + 0.041_556_0 * z,
        0.055_643_4 * x - 0.204_025_9 * y + 1.057_225_2 * z,
    )
}

// ─── Oklab ──────────────────────────────────────────────────────────────────

fn linear_srgb_to_oklab(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let l = 0.412_221_470_8 * r + 0.536_332_536_3 * g + 0.051_445_992_9 * b;
    let m = 0.211_903_498_2 * r + 0.680_699_545_1 * g + 0.107_396_956_6 * b;
    let s = 0.088_302_461_9 * r + 0.281_718_837_6 * g + 0.629_978_700_5 * b;

    let l_ = l.cbrt();
    let m_ = m.cbrt();
    let s_ = s.cbrt();

    (
        0.210_454_255_3 * l_ + 0.793_617_785_0 * m_ - 0.004_072_046_8 * s_,
        1.977_998_495_1 * l_ - 2.428_592_205_0 * m_ + 0.450_593_709_9 * s_,
        0.025_904_037_1 * l_ + 0.782_771_766_2 * m_ - 0.808_675_766_0 * s_,
    )
}

fn oklab_to_linear_srgb(l_ok: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let l_ = l_ok + 0.396_337_777_4 * a + 0.215_803_757_3 * b;
    let m_ = l_ok - 0.105_561_345_8 * a - 0.063_854_172_8 * b;
    let s_ = l_ok - 0.089_484_177_5 * a - 1.291_485_548_0 * b;

    let l = l_ * l_ * l_;
    let m = m_ * m_ * m_;
    let s = s_ * s_ * s_;

    (
        4.076_741_662_1 * l - 3.307_711_591_3 * m + 0.230_969_929_2 * s,
        -1.268_438_004_6 * l + 2.609_757_401_1 * m - 0.341_319_396_5 * s,
        -0.004_196_086_3 * l - 0.703_418_614_7 * m + 1.707_614_701_0 * s,
    )
}
