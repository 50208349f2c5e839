//! Style builders and the registry the control picks from.
//!
//! A builder turns an options tree into a complete style document and
//! exposes the default tree the form engine introspects. Builders are
//! external to the control; [`reference`] ships a small set that mirrors
//! the VersaTiles option shapes for demos and tests.

pub mod reference;

use crate::core::options::OptionsTree;
use crate::{Result, StylerError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// A complete declarative map style (sources, layers, paint rules).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleDocument(Value);

impl StyleDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }

    pub fn into_json(self) -> Value {
        self.0
    }

    pub fn version(&self) -> Option<u64> {
        self.0.get("version").and_then(Value::as_u64)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn layers(&self) -> &[Value] {
        self.0
            .get("layers")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn layer(&self, id: &str) -> Option<&Value> {
        self.layers()
            .iter()
            .find(|layer| layer.get("id").and_then(Value::as_str) == Some(id))
    }

    pub fn sources(&self) -> Option<&serde_json::Map<String, Value>> {
        self.0.get("sources").and_then(Value::as_object)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.0)?)
    }
}

/// Which group of option rows a style is edited with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleFamily {
    /// Vector styles: colors, recolor and text options.
    Vector,
    /// Raster imagery with an optional vector label overlay.
    Satellite,
}

/// Maps an options tree to a style document.
#[async_trait]
pub trait StyleBuilder: Send + Sync {
    /// Registry key, also the builder's name in exported code.
    fn key(&self) -> &str;

    fn family(&self) -> StyleFamily;

    /// Default options. Must be pure: called on every style switch and
    /// export.
    fn default_options(&self) -> OptionsTree;

    /// Whether the builder has to be awaited in exported code.
    fn is_async(&self) -> bool {
        false
    }

    /// Tile source the style renders from.
    fn required_source(&self) -> &str;

    async fn build(&self, options: &OptionsTree) -> Result<StyleDocument>;
}

/// Ordered set of builders, keyed by [`StyleBuilder::key`].
#[derive(Clone, Default)]
pub struct StyleRegistry {
    builders: Vec<Arc<dyn StyleBuilder>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the [`reference`] builders.
    pub fn reference() -> Self {
        reference::registry()
    }

    pub fn with_builder(mut self, builder: impl StyleBuilder + 'static) -> Self {
        self.register(Arc::new(builder));
        self
    }

    /// Add a builder; a builder with the same key is replaced in place.
    pub fn register(&mut self, builder: Arc<dyn StyleBuilder>) {
        match self.builders.iter().position(|b| b.key() == builder.key()) {
            Some(index) => {
                log::warn!("replacing style builder '{}'", builder.key());
                self.builders[index] = builder;
            }
            None => self.builders.push(builder),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn StyleBuilder>> {
        self.builders.iter().find(|b| b.key() == key).cloned()
    }

    /// Like [`get`](Self::get) but with the error the controller reports.
    pub fn require(&self, key: &str) -> Result<Arc<dyn StyleBuilder>> {
        self.get(key)
            .ok_or_else(|| StylerError::UnknownStyle(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.builders.iter().any(|b| b.key() == key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.builders.iter().map(|b| b.key().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }

    /// Keep only builders whose tile source is available. An empty or
    /// unmatched source list leaves the registry untouched so the panel is
    /// never left without styles.
    pub fn retain_sources(&self, sources: &[String]) -> Self {
        let filtered: Vec<_> = self
            .builders
            .iter()
            .filter(|b| sources.iter().any(|s| s == b.required_source()))
            .cloned()
            .collect();
        if filtered.is_empty() {
            return self.clone();
        }
        Self { builders: filtered }
    }
}

impl std::fmt::Debug for StyleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}
