//! Color model: parsing, formatting, and the numeric routines behind
//! readability checks.
//!
//! Everything here is pure. Colors travel through the engine as [`Rgb`]
//! triples; the strings read from and written to nodes use the
//! `rgb(r, g, b)` serialization that rendering engines report for
//! computed styles.

use palette::{IntoColor, Srgb};

// ============================================================================
// Rgb
// ============================================================================

/// An sRGB color with 8-bit channels.
///
/// Channels are always in [0, 255] by construction; every transform in
/// this crate clamps before building one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Creates a color from its three channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Converts to HSL with hue normalized to [0, 1).
    pub fn to_hsl(self) -> Hsl {
        let srgb = Srgb::new(
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        );
        let hsl: palette::Hsl = srgb.into_color();
        Hsl {
            h: hsl.hue.into_positive_degrees() / 360.0,
            s: hsl.saturation,
            l: hsl.lightness,
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

// ============================================================================
// Hsl
// ============================================================================

/// An HSL color. Hue is stored normalized to [0, 1), not degrees;
/// saturation and lightness are in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    pub h: f32,
    pub s: f32,
    pub l: f32,
}

impl Hsl {
    /// Converts back to an 8-bit RGB triple.
    pub fn to_rgb(self) -> Rgb {
        let hsl = palette::Hsl::new(self.h * 360.0, self.s, self.l);
        let srgb: Srgb = hsl.into_color();
        Rgb::new(
            (srgb.red * 255.0).round() as u8,
            (srgb.green * 255.0).round() as u8,
            (srgb.blue * 255.0).round() as u8,
        )
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses `rgb(r, g, b)` and `rgba(r, g, b, a)` color strings.
///
/// Whitespace around the function name, parentheses, and components is
/// tolerated. Any other syntax (named colors, hex, `hsl()`, gradients)
/// yields `None`; callers treat `None` as "leave the value unchanged".
/// The alpha component of `rgba()` is accepted and discarded.
pub fn parse_color(text: &str) -> Option<Rgb> {
    let (r, g, b, _alpha) = parse_components(text)?;
    Some(Rgb::new(r, g, b))
}

/// Reports whether a color string is the fully-transparent sentinel:
/// the `transparent` keyword or an `rgba()` value with zero alpha.
pub fn is_transparent(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.eq_ignore_ascii_case("transparent") {
        return true;
    }
    matches!(parse_components(trimmed), Some((_, _, _, Some(alpha))) if alpha == 0.0)
}

/// Shared component parser for `rgb()`/`rgba()`. Returns the three
/// channels plus the alpha when the `rgba` form was used.
fn parse_components(text: &str) -> Option<(u8, u8, u8, Option<f32>)> {
    let s = text.trim();
    let lower = s.to_ascii_lowercase();

    let (rest, has_alpha) = if let Some(rest) = lower.strip_prefix("rgba") {
        (rest, true)
    } else if let Some(rest) = lower.strip_prefix("rgb") {
        (rest, false)
    } else {
        return None;
    };

    let body = rest.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    let mut parts = body.split(',').map(str::trim);

    let r = parse_channel(parts.next()?)?;
    let g = parse_channel(parts.next()?)?;
    let b = parse_channel(parts.next()?)?;
    let alpha = if has_alpha {
        Some(parts.next()?.parse::<f32>().ok()?.clamp(0.0, 1.0))
    } else {
        None
    };

    // Trailing components make the string something other than the
    // rgb()/rgba() grammar.
    if parts.next().is_some() {
        return None;
    }

    Some((r, g, b, alpha))
}

fn parse_channel(part: &str) -> Option<u8> {
    let value = part.parse::<f32>().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, 255.0).round() as u8)
}

// ============================================================================
// Luminance & contrast
// ============================================================================

/// Contrast required for normal-size text (WCAG AA).
pub const NORMAL_TEXT_CONTRAST: f64 = 4.5;

/// Contrast required for large text (WCAG AA).
pub const LARGE_TEXT_CONTRAST: f64 = 3.0;

/// WCAG 2.1 relative luminance.
///
/// Each channel is sRGB-decoded through the standard piecewise gamma
/// curve, then combined with the perceptual channel weights. Returns a
/// value in [0.0, 1.0].
pub fn luminance(color: Rgb) -> f64 {
    let r = linearize(color.r);
    let g = linearize(color.g);
    let b = linearize(color.b);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

fn linearize(channel: u8) -> f64 {
    let c = f64::from(channel) / 255.0;
    if c <= 0.03928 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG 2.1 contrast ratio between two colors, in [1.0, 21.0].
///
/// Symmetric in its arguments; a color against itself is 1.0.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let la = luminance(a);
    let lb = luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Checks whether a text/background pair meets the WCAG AA contrast
/// threshold (4.5:1 for normal text, 3.0:1 for large text).
///
/// Deliberately fails open: when either string does not parse as
/// `rgb()`/`rgba()`, the pair is assumed acceptable so an unknown
/// format never blocks transformation.
pub fn meets_accessibility(text: &str, background: &str, is_large_text: bool) -> bool {
    let (Some(fg), Some(bg)) = (parse_color(text), parse_color(background)) else {
        return true;
    };
    let required = if is_large_text {
        LARGE_TEXT_CONTRAST
    } else {
        NORMAL_TEXT_CONTRAST
    };
    contrast_ratio(fg, bg) >= required
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    // ── Parsing ─────────────────────────────────────────────────────

    #[test]
    fn parses_rgb() {
        assert_eq!(parse_color("rgb(10, 20, 30)"), Some(Rgb::new(10, 20, 30)));
        assert_eq!(parse_color("rgb(0,0,0)"), Some(Rgb::new(0, 0, 0)));
    }

    #[test]
    fn parses_rgba_and_drops_alpha() {
        assert_eq!(
            parse_color("rgba(255, 128, 0, 0.5)"),
            Some(Rgb::new(255, 128, 0))
        );
    }

    #[test]
    fn tolerates_whitespace() {
        assert_eq!(
            parse_color("  rgb( 1 , 2 , 3 )  "),
            Some(Rgb::new(1, 2, 3))
        );
        assert_eq!(parse_color("RGB(4, 5, 6)"), Some(Rgb::new(4, 5, 6)));
    }

    #[test]
    fn rejects_other_syntaxes() {
        assert_eq!(parse_color("#ff0000"), None);
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("hsl(0, 100%, 50%)"), None);
        assert_eq!(parse_color("linear-gradient(to right, red, blue)"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn rejects_malformed_components() {
        assert_eq!(parse_color("rgb(1, 2)"), None);
        assert_eq!(parse_color("rgb(1, 2, 3, 4)"), None);
        assert_eq!(parse_color("rgba(1, 2, 3)"), None);
        assert_eq!(parse_color("rgb(a, b, c)"), None);
    }

    #[test]
    fn out_of_range_channels_clamp() {
        assert_eq!(parse_color("rgb(300, -5, 128)"), Some(Rgb::new(255, 0, 128)));
    }

    #[test]
    fn transparent_sentinel() {
        assert!(is_transparent("transparent"));
        assert!(is_transparent("  Transparent "));
        assert!(is_transparent("rgba(0, 0, 0, 0)"));
        assert!(is_transparent("rgba(10, 20, 30, 0.0)"));
        assert!(!is_transparent("rgba(0, 0, 0, 0.5)"));
        assert!(!is_transparent("rgb(0, 0, 0)"));
    }

    // ── Luminance ───────────────────────────────────────────────────

    #[test]
    fn luminance_black_is_zero() {
        assert!(approx_eq(luminance(Rgb::new(0, 0, 0)), 0.0, 0.001));
    }

    #[test]
    fn luminance_white_is_one() {
        assert!(approx_eq(luminance(Rgb::new(255, 255, 255)), 1.0, 0.001));
    }

    #[test]
    fn luminance_channel_weights() {
        assert!(approx_eq(luminance(Rgb::new(255, 0, 0)), 0.2126, 0.001));
        assert!(approx_eq(luminance(Rgb::new(0, 255, 0)), 0.7152, 0.001));
        assert!(approx_eq(luminance(Rgb::new(0, 0, 255)), 0.0722, 0.001));
    }

    // ── Contrast ────────────────────────────────────────────────────

    #[test]
    fn contrast_black_white_is_21() {
        let ratio = contrast_ratio(Rgb::new(0, 0, 0), Rgb::new(255, 255, 255));
        assert!(approx_eq(ratio, 21.0, 0.1), "B/W contrast: {ratio}");
    }

    #[test]
    fn contrast_self_is_one() {
        let c = Rgb::new(120, 90, 200);
        assert!(approx_eq(contrast_ratio(c, c), 1.0, 1e-9));
    }

    #[test]
    fn contrast_is_symmetric() {
        let a = Rgb::new(200, 60, 80);
        let b = Rgb::new(30, 30, 110);
        assert!(approx_eq(contrast_ratio(a, b), contrast_ratio(b, a), 1e-9));
    }

    #[test]
    fn accessibility_thresholds() {
        // Black on white passes everything.
        assert!(meets_accessibility("rgb(0, 0, 0)", "rgb(255, 255, 255)", false));
        // Mid gray on white fails normal text but passes large text.
        assert!(!meets_accessibility("rgb(140, 140, 140)", "rgb(255, 255, 255)", false));
        assert!(meets_accessibility("rgb(140, 140, 140)", "rgb(255, 255, 255)", true));
    }

    #[test]
    fn accessibility_fails_open_on_unparsable_input() {
        assert!(meets_accessibility("papayawhip", "rgb(255, 255, 255)", false));
        assert!(meets_accessibility("rgb(0, 0, 0)", "#000", false));
        assert!(meets_accessibility("", "", false));
    }

    // ── HSL ─────────────────────────────────────────────────────────

    #[test]
    fn hsl_hue_is_normalized() {
        let red = Rgb::new(255, 0, 0).to_hsl();
        assert!(red.h.abs() < 0.01, "red hue: {}", red.h);

        let blue = Rgb::new(0, 0, 255).to_hsl();
        assert!((blue.h - 2.0 / 3.0).abs() < 0.01, "blue hue: {}", blue.h);
    }

    #[test]
    fn hsl_grayscale_extremes() {
        let white = Rgb::new(255, 255, 255).to_hsl();
        assert!((white.l - 1.0).abs() < 0.001);

        let black = Rgb::new(0, 0, 0).to_hsl();
        assert!(black.l.abs() < 0.001);
    }

    #[test]
    fn hsl_round_trip() {
        let original = Rgb::new(180, 40, 90);
        let back = original.to_hsl().to_rgb();
        // Conversion goes through f32, allow one step of rounding drift.
        assert!((i16::from(back.r) - i16::from(original.r)).abs() <= 1);
        assert!((i16::from(back.g) - i16::from(original.g)).abs() <= 1);
        assert!((i16::from(back.b) - i16::from(original.b)).abs() <= 1);
    }

    #[test]
    fn rgb_display_matches_computed_style_serialization() {
        assert_eq!(Rgb::new(245, 245, 245).to_string(), "rgb(245, 245, 245)");
    }
}
