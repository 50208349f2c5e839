//! Reference builders mirroring the VersaTiles option shapes.
//!
//! They produce small but valid style documents: one layer per palette
//! color, a label layer and the shortbread vector source, or a raster layer
//! for satellite imagery. Real deployments register their own builders.

use super::{StyleBuilder, StyleDocument, StyleFamily, StyleRegistry};
use crate::core::color::{Color, Recolor};
use crate::core::constants::{DEFAULT_ORIGIN, SATELLITE_SOURCE, VECTOR_SOURCE};
use crate::core::options::{OptionValue, OptionsTree};
use crate::{options_tree, Result, StylerError};
use async_trait::async_trait;
use serde_json::{json, Value};

const VECTOR_SOURCE_ID: &str = "versatiles-shortbread";
const SATELLITE_SOURCE_ID: &str = "versatiles-satellite";

/// Every palette carries the same keys, in this order.
const PALETTE_KEYS: [&str; 10] = [
    "land", "water", "glacier", "wood", "grass", "park", "building", "street", "boundary", "label",
];

fn palette(colors: [&str; 10]) -> OptionsTree {
    PALETTE_KEYS.iter().copied().zip(colors).collect()
}

/// Registry with the five vector styles followed by satellite.
pub fn registry() -> StyleRegistry {
    StyleRegistry::new()
        .with_builder(VectorStyle::colorful())
        .with_builder(VectorStyle::eclipse())
        .with_builder(VectorStyle::graybeard())
        .with_builder(VectorStyle::shadow())
        .with_builder(VectorStyle::neutrino())
        .with_builder(SatelliteStyle)
}

/// A vector style defined by its palette.
#[derive(Debug, Clone)]
pub struct VectorStyle {
    key: String,
    colors: OptionsTree,
}

impl VectorStyle {
    pub fn new(key: impl Into<String>, colors: OptionsTree) -> Self {
        Self {
            key: key.into(),
            colors,
        }
    }

    pub fn colorful() -> Self {
        Self::new(
            "colorful",
            palette([
                "#f9f4ee", "#beddf3", "#ffffff", "#66aa44", "#d9d9a5", "#d9d9a5", "#f2eae2",
                "#ffffff", "#a6a6c8", "#333344",
            ]),
        )
    }

    pub fn eclipse() -> Self {
        Self::new(
            "eclipse",
            palette([
                "#06110c", "#041d32", "#0e1a22", "#0c2413", "#122313", "#122313", "#0e0d0c",
                "#0d0c0c", "#57577a", "#cccccc",
            ]),
        )
    }

    pub fn graybeard() -> Self {
        Self::new(
            "graybeard",
            palette([
                "#f5f5f5", "#cfcfcf", "#ffffff", "#a3a3a3", "#dedede", "#dedede", "#ebebeb",
                "#ffffff", "#b5b5b5", "#333333",
            ]),
        )
    }

    pub fn shadow() -> Self {
        Self::new(
            "shadow",
            palette([
                "#333333", "#141414", "#3d3d3d", "#262626", "#2e2e2e", "#2e2e2e", "#1f1f1f",
                "#474747", "#5c5c5c", "#bfbfbf",
            ]),
        )
    }

    pub fn neutrino() -> Self {
        Self::new(
            "neutrino",
            palette([
                "#f6f0f6", "#cbd2df", "#ffffff", "#e0e4e5", "#ecf0ec", "#ecf0ec", "#f2ecf2",
                "#f6f0f6", "#e6cce6", "#cbb7b7",
            ]),
        )
    }

    fn label_field(language: &str) -> String {
        if language.is_empty() {
            "{name}".to_string()
        } else {
            format!("{{name_{language}}}")
        }
    }
}

/// String option, falling back to `fallback` when absent or blank.
fn text_or<'a>(tree: &'a OptionsTree, key: &str, fallback: &'a str) -> &'a str {
    match tree.get(key).and_then(OptionValue::as_str) {
        Some(text) if !text.is_empty() => text,
        _ => fallback,
    }
}

fn vector_source(base_url: &str) -> Value {
    json!({
        "type": "vector",
        "tiles": [format!("{base_url}/tiles/{VECTOR_SOURCE}/{{z}}/{{x}}/{{y}}")],
        "scheme": "xyz",
        "minzoom": 0,
        "maxzoom": 14,
    })
}

fn label_layer(source_layer: &str, font: &str, language: &str, color: &str) -> Value {
    json!({
        "id": "label-place",
        "type": "symbol",
        "source": VECTOR_SOURCE_ID,
        "source-layer": source_layer,
        "layout": {
            "text-field": VectorStyle::label_field(language),
            "text-font": [font],
        },
        "paint": { "text-color": color },
    })
}

#[async_trait]
impl StyleBuilder for VectorStyle {
    fn key(&self) -> &str {
        &self.key
    }

    fn family(&self) -> StyleFamily {
        StyleFamily::Vector
    }

    fn default_options(&self) -> OptionsTree {
        options_tree! {
            "baseUrl" => DEFAULT_ORIGIN,
            "hideLabels" => false,
            "language" => "",
            "colors" => self.colors.clone(),
            "fonts" => options_tree! {
                "regular" => "noto_sans_regular",
                "bold" => "noto_sans_bold",
            },
            "recolor" => Recolor::default_options(),
        }
    }

    fn required_source(&self) -> &str {
        VECTOR_SOURCE
    }

    async fn build(&self, options: &OptionsTree) -> Result<StyleDocument> {
        let base_url = text_or(options, "baseUrl", DEFAULT_ORIGIN);
        let empty = OptionsTree::new();
        let recolor = Recolor::from_options(options.subtree("recolor").unwrap_or(&empty))?;
        let colors = options.subtree("colors").unwrap_or(&self.colors);
        let fonts = options.subtree("fonts").unwrap_or(&empty);

        let mut paint = Vec::new();
        for (key, value) in colors.iter() {
            let raw = value.as_str().ok_or_else(|| {
                StylerError::Build(format!("color '{key}' is a {}", value.kind_name()))
            })?;
            paint.push((key, recolor.apply(Color::parse(raw)?).to_hex()));
        }

        let mut layers = Vec::new();
        for (key, color) in &paint {
            if *key == "land" {
                layers.push(json!({
                    "id": "background",
                    "type": "background",
                    "paint": { "background-color": color },
                }));
            } else if *key != "label" {
                layers.push(json!({
                    "id": key,
                    "type": "fill",
                    "source": VECTOR_SOURCE_ID,
                    "source-layer": key,
                    "paint": { "fill-color": color },
                }));
            }
        }

        let hide_labels = options
            .get("hideLabels")
            .and_then(OptionValue::as_bool)
            .unwrap_or(false);
        if !hide_labels {
            let label_color = paint
                .iter()
                .find(|(key, _)| *key == "label")
                .map(|(_, color)| color.as_str())
                .unwrap_or("#000000");
            layers.push(label_layer(
                "place_labels",
                text_or(fonts, "regular", "noto_sans_regular"),
                text_or(options, "language", ""),
                label_color,
            ));
        }

        Ok(StyleDocument::new(json!({
            "version": 8,
            "name": self.key,
            "metadata": { "license": "https://creativecommons.org/publicdomain/zero/1.0/" },
            "glyphs": format!("{base_url}/assets/glyphs/{{fontstack}}/{{range}}.pbf"),
            "sprite": [{ "id": "basics", "url": format!("{base_url}/assets/sprites/basics/sprites") }],
            "sources": { VECTOR_SOURCE_ID: vector_source(base_url) },
            "layers": layers,
        })))
    }
}

/// Satellite imagery with optional vector labels on top.
#[derive(Debug, Clone, Copy, Default)]
pub struct SatelliteStyle;

#[async_trait]
impl StyleBuilder for SatelliteStyle {
    fn key(&self) -> &str {
        "satellite"
    }

    fn family(&self) -> StyleFamily {
        StyleFamily::Satellite
    }

    fn default_options(&self) -> OptionsTree {
        options_tree! {
            "baseUrl" => DEFAULT_ORIGIN,
            "overlay" => true,
            "rasterOpacity" => 1.0,
            "rasterHueRotate" => 0.0,
            "rasterBrightnessMin" => 0.0,
            "rasterBrightnessMax" => 1.0,
            "rasterSaturation" => 0.0,
            "rasterContrast" => 0.0,
        }
    }

    fn is_async(&self) -> bool {
        true
    }

    fn required_source(&self) -> &str {
        SATELLITE_SOURCE
    }

    async fn build(&self, options: &OptionsTree) -> Result<StyleDocument> {
        let defaults = self.default_options();
        let base_url = text_or(options, "baseUrl", DEFAULT_ORIGIN);
        let number = |key: &str| {
            options
                .get(key)
                .or_else(|| defaults.get(key))
                .and_then(OptionValue::as_f64)
                .unwrap_or(0.0)
        };

        let mut sources = serde_json::Map::new();
        sources.insert(
            SATELLITE_SOURCE_ID.to_string(),
            json!({
                "type": "raster",
                "tiles": [format!("{base_url}/tiles/{SATELLITE_SOURCE}/{{z}}/{{x}}/{{y}}")],
                "tileSize": 512,
                "maxzoom": 17,
            }),
        );
        let mut layers = vec![json!({
            "id": "satellite",
            "type": "raster",
            "source": SATELLITE_SOURCE_ID,
            "paint": {
                "raster-opacity": number("rasterOpacity"),
                "raster-hue-rotate": number("rasterHueRotate"),
                "raster-brightness-min": number("rasterBrightnessMin"),
                "raster-brightness-max": number("rasterBrightnessMax"),
                "raster-saturation": number("rasterSaturation"),
                "raster-contrast": number("rasterContrast"),
            },
        })];

        let overlay = options
            .get("overlay")
            .and_then(OptionValue::as_bool)
            .unwrap_or(true);
        if overlay {
            sources.insert(VECTOR_SOURCE_ID.to_string(), vector_source(base_url));
            layers.push(label_layer(
                "place_labels",
                "noto_sans_regular",
                "",
                "#ffffff",
            ));
        }

        Ok(StyleDocument::new(json!({
            "version": 8,
            "name": "satellite",
            "glyphs": format!("{base_url}/assets/glyphs/{{fontstack}}/{{range}}.pbf"),
            "sources": sources,
            "layers": layers,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_vector_build_uses_base_url() {
        let style = VectorStyle::colorful();
        let mut options = style.default_options();
        options.insert("baseUrl", "https://custom.example.org");

        let document = style.build(&options).await.unwrap();
        assert_eq!(document.version(), Some(8));
        let json = serde_json::to_string(document.as_json()).unwrap();
        assert!(json.contains("custom.example.org"));
    }

    #[tokio::test]
    async fn test_vector_build_applies_color_and_recolor() {
        let style = VectorStyle::colorful();
        let mut options = style.default_options();
        options.set_path(&"colors.water".into(), "#ff0000").unwrap();
        let document = style.build(&options).await.unwrap();
        assert_eq!(
            document.layer("water").unwrap()["paint"]["fill-color"],
            "#ff0000"
        );

        options.set_path(&"recolor.rotate".into(), 120.0).unwrap();
        let document = style.build(&options).await.unwrap();
        assert_eq!(
            document.layer("water").unwrap()["paint"]["fill-color"],
            "#00ff00"
        );
    }

    #[tokio::test]
    async fn test_language_and_hidden_labels() {
        let style = VectorStyle::eclipse();
        let mut options = style.default_options();
        options.insert("language", "de");
        let document = style.build(&options).await.unwrap();
        assert_eq!(
            document.layer("label-place").unwrap()["layout"]["text-field"],
            "{name_de}"
        );

        options.insert("hideLabels", true);
        let document = style.build(&options).await.unwrap();
        assert!(document.layer("label-place").is_none());
    }

    #[tokio::test]
    async fn test_invalid_color_fails_build() {
        let style = VectorStyle::shadow();
        let mut options = style.default_options();
        options.set_path(&"colors.water".into(), "not a color").unwrap();
        assert!(matches!(
            style.build(&options).await,
            Err(StylerError::InvalidColor(_))
        ));
    }

    #[tokio::test]
    async fn test_satellite_overlay_toggle() {
        let style = SatelliteStyle;
        let mut options = style.default_options();
        let document = style.build(&options).await.unwrap();
        assert_eq!(document.sources().unwrap().len(), 2);

        options.insert("overlay", false);
        options.insert("rasterOpacity", 0.5);
        let document = style.build(&options).await.unwrap();
        assert_eq!(document.sources().unwrap().len(), 1);
        assert_eq!(document.layer("satellite").unwrap()["paint"]["raster-opacity"], 0.5);
    }

    #[test]
    fn test_palettes_share_keys() {
        let colorful = VectorStyle::colorful().default_options();
        let neutrino = VectorStyle::neutrino().default_options();
        let keys = |tree: &OptionsTree| -> Vec<String> {
            tree.subtree("colors").unwrap().keys().map(str::to_string).collect()
        };
        assert_eq!(keys(&colorful), keys(&neutrino));
        assert_ne!(
            colorful.get_path(&"colors.land".into()),
            neutrino.get_path(&"colors.land".into())
        );
    }
}
