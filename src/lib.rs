//! # maplet-styler
//!
//! A style editing control for maplet-family maps.
//!
//! The control lets a user pick a base cartographic style, tweak feature
//! colors, apply global recolor transforms, choose fonts and label language,
//! and export the result either as a full style document or as the minimal
//! set of options that differ from the style's defaults.
//!
//! The heavy lifting is done by a small reflection engine: form rows are
//! derived from a style's default options tree, edits flow back into a live
//! tree, and [`core::diff`] reduces the live tree to what actually changed.
//! Everything that touches a real screen, map or browser sits behind the
//! traits in [`traits`] and [`ui::surface`], so the engine runs headless.

pub mod control;
pub mod core;
pub mod export;
pub mod hash;
pub mod prelude;
pub mod runtime;
pub mod styles;
pub mod tiles;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    color::{Color, Recolor},
    config::StylerConfig,
    diff::{diff, diff_tree, merge},
    geo::{Camera, LatLng},
    options::{OptionPath, OptionValue, OptionsTree},
};

pub use control::{PanelEvent, PanelOutcome, StylerControl};

pub use hash::{HashSync, ViewState};

pub use styles::{StyleBuilder, StyleDocument, StyleRegistry};

pub use traits::{Clipboard, FragmentStore, MapEvent, MapSurface};

pub use ui::{
    fields::{FieldDescriptor, FieldKind},
    list::{FieldList, FieldState},
    surface::{ContainerId, UiSurface},
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, StylerError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum StylerError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to fetch JSON from {url}: {status}")]
    Http { url: String, status: String },

    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    #[error("Unsupported option value: {0}")]
    UnsupportedValue(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid option path: {0}")]
    InvalidPath(String),

    #[error("Style build error: {0}")]
    Build(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Config error: {0}")]
    Config(String),
}

/// Error type alias for convenience
pub type Error = StylerError;

/// Initialise `env_logger` once; later calls are no-ops.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(cfg!(test)).try_init();
}
