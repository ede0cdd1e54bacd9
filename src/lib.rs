//! umbra-engine: dark-mode classification and color transform for live
//! element trees.
//!
//! This crate classifies the elements of a mutating tree and applies a
//! reversible, parameterized color transform to produce a dark
//! rendering: media stays visually untouched, text stays legible, and
//! a constantly-changing tree stays consistent with the current
//! settings through incremental re-application.
//!
//! # Example
//!
//! ```
//! use umbra_engine::{DarkModeEngine, Document, Settings};
//!
//! let mut doc = Document::new();
//! let body = doc.create_element("body");
//! doc.append_child(doc.root(), body);
//!
//! let heading = doc.create_element("h1");
//! doc.set_computed_style(heading, "color", "rgb(10, 10, 10)");
//! doc.append_child(body, heading);
//!
//! let mut engine = DarkModeEngine::new();
//! engine.apply_settings(&mut doc, Settings { enabled: true, ..Settings::default() });
//!
//! assert_eq!(doc.style(heading, "color"), Some("rgb(245, 245, 245)"));
//!
//! // Slider changes re-apply from cached originals; nodes inserted
//! // later are picked up through mutation batches.
//! let note = doc.create_element("p");
//! doc.set_computed_style(note, "color", "rgb(50, 50, 50)");
//! doc.append_child(body, note);
//! engine.process_mutations(&mut doc);
//!
//! assert_eq!(doc.style(note, "color"), Some("rgb(205, 205, 205)"));
//! ```
//!
//! # Settings Snapshots
//!
//! Settings arrive as complete [`Settings`] snapshots, typically as
//! JSON from a control surface, and are looked up per site through a
//! [`SettingsStore`]:
//!
//! ```
//! use umbra_engine::Settings;
//!
//! let settings = Settings::from_json(r#"{"enabled":true,"warmth":0.3}"#).unwrap();
//! assert_eq!(settings.warmth, 0.3);
//! ```

mod cache;
mod classify;
mod color;
mod engine;
mod observer;
mod settings;
mod transform;
mod tree;

pub use cache::{OriginalColorCache, OriginalColors};
pub use classify::{Classification, Classifier};
pub use color::{
    Hsl, LARGE_TEXT_CONTRAST, NORMAL_TEXT_CONTRAST, Rgb, contrast_ratio, is_transparent,
    luminance, meets_accessibility, parse_color,
};
pub use engine::{ApplyOutcome, DarkModeEngine, EngineError, Phase};
pub use observer::{ChangeObserver, ObserverState};
pub use settings::{
    BRIGHTNESS_RANGE, CONTRAST_RANGE, InMemoryStore, Settings, SettingsStore, WARMTH_RANGE,
};
pub use transform::invert;
pub use tree::{Document, MutationKind, MutationRecord, NodeId};
