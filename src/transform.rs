//! The color transform: inversion shaped by the current settings.
//!
//! [`invert`] is deterministic and stateless. Its contract is that it
//! is always fed a node's *original* color, never a previously
//! transformed one; recomputing from originals is what keeps repeated
//! settings changes from compounding distortion. The original-color
//! cache exists to uphold that contract.

use crate::color::Rgb;
use crate::settings::Settings;

// Per-channel shift at full warmth, before clamping.
const WARMTH_RED: f32 = 25.0;
const WARMTH_GREEN: f32 = 15.0;
const WARMTH_BLUE: f32 = -40.0;

/// Maps an original color to its dark-theme replacement.
///
/// The pipeline, applied per channel:
///
/// 1. invert: `255 - channel`
/// 2. brightness: scale the distance from the midpoint
/// 3. contrast: scale again, on the brightness output
/// 4. warmth (when > 0): shift red/green up, blue down
/// 5. clamp to [0, 255] and round
///
/// Output channels are in range for *any* settings values, documented
/// or not.
pub fn invert(original: Rgb, settings: &Settings) -> Rgb {
    let mut r = 255.0 - f32::from(original.r);
    let mut g = 255.0 - f32::from(original.g);
    let mut b = 255.0 - f32::from(original.b);

    r = scale_about_midpoint(r, settings.brightness);
    g = scale_about_midpoint(g, settings.brightness);
    b = scale_about_midpoint(b, settings.brightness);

    r = scale_about_midpoint(r, settings.contrast);
    g = scale_about_midpoint(g, settings.contrast);
    b = scale_about_midpoint(b, settings.contrast);

    if settings.warmth > 0.0 {
        r += settings.warmth * WARMTH_RED;
        g += settings.warmth * WARMTH_GREEN;
        b += settings.warmth * WARMTH_BLUE;
    }

    Rgb::new(clamp_channel(r), clamp_channel(g), clamp_channel(b))
}

fn scale_about_midpoint(channel: f32, factor: f32) -> f32 {
    128.0 + (channel - 128.0) * factor
}

fn clamp_channel(value: f32) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

// ============================================================================
// Tests
// ============================================================================
