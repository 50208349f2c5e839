//! Configuration for the styler control
//!
//! Mirrors the options a host passes when adding the control to a map.
//! Everything has a default, so an empty JSON object is a valid config.

use crate::core::constants::{DEFAULT_ORIGIN, DEFAULT_STYLE_KEY, HASH_THROTTLE_MS};
use crate::{Result, StylerError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StylerConfig {
    /// Tile server every URL is resolved against; also injected as the
    /// `baseUrl` option of each style.
    pub origin: String,
    /// Whether the pane starts expanded.
    pub open: bool,
    /// Keep camera and style in the URL fragment.
    pub hash: bool,
    /// Style selected when the fragment does not name one.
    pub default_style: String,
    pub throttle_ms: u64,
    /// Skip every network lookup (source discovery, fonts, languages).
    pub offline: bool,
    pub tile_index_path: String,
    pub tile_json_path: String,
    pub font_index_path: String,
}

impl Default for StylerConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            open: false,
            hash: true,
            default_style: DEFAULT_STYLE_KEY.to_string(),
            throttle_ms: HASH_THROTTLE_MS,
            offline: false,
            tile_index_path: "/tiles/index.json".to_string(),
            tile_json_path: "/tiles/osm/tiles.json".to_string(),
            font_index_path: "/assets/glyphs/font_families.json".to_string(),
        }
    }
}

impl StylerConfig {
    /// Preset for tests and embedded use: no network, no fragment sync,
    /// pane open.
    pub fn offline() -> Self {
        Self {
            open: true,
            hash: false,
            offline: true,
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_style.is_empty() {
            return Err(StylerError::Config("defaultStyle must not be empty".into()));
        }
        if self.origin.ends_with('/') {
            return Err(StylerError::Config(format!(
                "origin must not end with '/': {}",
                self.origin
            )));
        }
        Ok(())
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    /// Join `path` onto the origin.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            format!("{}/{}", self.origin, path)
        }
    }

    pub fn tile_index_url(&self) -> String {
        self.url(&self.tile_index_path)
    }

    pub fn tile_json_url(&self) -> String {
        self.url(&self.tile_json_path)
    }

    pub fn font_index_url(&self) -> String {
        self.url(&self.font_index_path)
    }
}
