//! Serializable theme settings for cross-process communication.
//!
//! A [`Settings`] value is the complete snapshot exchanged with the
//! control surface: it arrives whole (never as a partial delta) on page
//! activation and on every slider change, and it is reported back
//! verbatim for display synchronization.
//!
//! # Example
//!
//! ```
//! use umbra_engine::Settings;
//!
//! let settings = Settings::from_json(r#"{"enabled":true,"brightness":1.2}"#).unwrap();
//! assert!(settings.enabled);
//! assert_eq!(settings.brightness, 1.2);
//! // Fields absent from the snapshot fall back to defaults.
//! assert_eq!(settings.contrast, 1.0);
//! ```
//!
//! The persistence side is one record per site identity (a domain
//! string); [`SettingsStore`] is the read-only lookup contract and
//! [`InMemoryStore`] the reference implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Documented brightness range.
pub const BRIGHTNESS_RANGE: std::ops::RangeInclusive<f32> = 0.5..=1.5;

/// Documented contrast range.
pub const CONTRAST_RANGE: std::ops::RangeInclusive<f32> = 0.5..=2.0;

/// Documented warmth range.
pub const WARMTH_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;

// ============================================================================
// Settings
// ============================================================================

/// A complete theme settings snapshot.
///
/// # JSON Format
///
/// ```json
/// {
///   "enabled": true,
///   "brightness": 1.1,
///   "contrast": 1.0,
///   "warmth": 0.25
/// }
/// ```
///
/// Missing fields deserialize to their defaults, so an empty object is
/// a valid (disabled) snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Settings {
    /// Whether the dark theme is active.
    pub enabled: bool,

    /// Brightness factor applied after inversion, in [0.5, 1.5].
    pub brightness: f32,

    /// Contrast factor applied after brightness, in [0.5, 2.0].
    pub contrast: f32,

    /// Warm tint strength, in [0, 1]. Zero leaves colors untinted.
    pub warmth: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: false,
            brightness: 1.0,
            contrast: 1.0,
            warmth: 0.0,
        }
    }
}

impl Settings {
    /// The default snapshot: disabled, unit brightness and contrast,
    /// no warmth.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with every slider clamped to its documented
    /// range. Out-of-range inbound values are clamped rather than
    /// rejected; the engine never sees an undocumented value.
    pub fn clamped(self) -> Self {
        Self {
            enabled: self.enabled,
            brightness: self
                .brightness
                .clamp(*BRIGHTNESS_RANGE.start(), *BRIGHTNESS_RANGE.end()),
            contrast: self
                .contrast
                .clamp(*CONTRAST_RANGE.start(), *CONTRAST_RANGE.end()),
            warmth: self.warmth.clamp(*WARMTH_RANGE.start(), *WARMTH_RANGE.end()),
        }
    }

    /// Serializes the snapshot to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a snapshot from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Read-only lookup into the external per-site settings store.
///
/// The store itself (its file format, its write path) belongs to an
/// outside collaborator; the engine only ever asks "what are the
/// settings for this domain".
pub trait SettingsStore {
    /// Returns the stored record for a domain, if one exists.
    fn load(&self, domain: &str) -> Option<Settings>;

    /// Returns the effective settings for a domain: the stored record
    /// clamped to documented ranges, or the defaults when no record
    /// exists. Absence is not an error.
    fn settings_for(&self, domain: &str) -> Settings {
        self.load(domain).map(Settings::clamped).unwrap_or_default()
    }
}

/// A map-backed [`SettingsStore`], one record per domain.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: HashMap<String, Settings>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the record for a domain.
    pub fn insert(&mut self, domain: impl Into<String>, settings: Settings) {
        self.records.insert(domain.into(), settings);
    }
}

impl SettingsStore for InMemoryStore {
    fn load(&self, domain: &str) -> Option<Settings> {
        self.records.get(domain).copied()
    }
}

// ============================================================================
// Tests
// ============================================================================
