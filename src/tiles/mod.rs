//! Tile server metadata: TileJSON languages, available sources, fonts.
//!
//! All requests go through one shared `reqwest` client. Failures come back
//! as [`StylerError::Http`] naming the URL and status; callers treat them as
//! "feature unavailable".

use crate::{Result, StylerError};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Shared async HTTP client for metadata requests
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(build_client);

#[cfg(not(target_arch = "wasm32"))]
fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("maplet-styler/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(30))
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .build()
        .unwrap_or_else(|err| {
            log::warn!("falling back to a default HTTP client: {err}");
            reqwest::Client::new()
        })
}

#[cfg(target_arch = "wasm32")]
fn build_client() -> reqwest::Client {
    reqwest::Client::new()
}

/// GET `url` and decode the JSON body. Non-2xx responses are errors.
pub async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T> {
    log::debug!("fetching {url}");
    let response = HTTP_CLIENT.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let status = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        return Err(StylerError::Http {
            url: url.to_string(),
            status,
        });
    }
    Ok(response.json::<T>().await?)
}

pub async fn fetch_tile_json(url: &str) -> Result<TileJson> {
    fetch_json(url).await
}

/// Names of the tile sources the server publishes (`["osm", "satellite"]`).
pub async fn fetch_tile_sources(url: &str) -> Result<Vec<String>> {
    fetch_json(url).await
}

/// Font family ids from the glyph index.
pub async fn fetch_font_families(url: &str) -> Result<Vec<FontFamily>> {
    let value: Value = fetch_json(url).await?;
    FontFamily::list_from_json(value)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VectorLayer {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// The parts of a TileJSON document the styler reads.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TileJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub vector_layers: Option<Vec<VectorLayer>>,
}

impl TileJson {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Language select entries as `(label, code)`.
    ///
    /// Codes come from `name_<xx>` fields of every vector layer, sorted and
    /// deduplicated. The `local` entry with the empty code is always first.
    pub fn languages(&self) -> Vec<(String, String)> {
        let mut codes = vec![String::new()];
        for layer in self.vector_layers.iter().flatten() {
            for field in layer.fields.keys() {
                if let Some(code) = language_code(field) {
                    codes.push(code.to_string());
                }
            }
        }
        codes.sort();
        codes.dedup();

        codes
            .into_iter()
            .map(|code| {
                if code.is_empty() {
                    ("local".to_string(), code)
                } else {
                    let label = language_name(&code)
                        .map(str::to_string)
                        .unwrap_or_else(|| code.clone());
                    (label, code)
                }
            })
            .collect()
    }
}

fn language_code(field: &str) -> Option<&str> {
    let code = field.strip_prefix("name_")?;
    let word = |c: char| c.is_ascii_alphanumeric() || c == '_';
    (code.chars().count() == 2 && code.chars().all(word)).then_some(code)
}

/// Native name of a language, as a browser's display-name lookup gives it.
fn language_name(code: &str) -> Option<&'static str> {
    let name = match code {
        "ar" => "العربية",
        "cs" => "čeština",
        "da" => "dansk",
        "de" => "Deutsch",
        "el" => "Ελληνικά",
        "en" => "English",
        "es" => "español",
        "fi" => "suomi",
        "fr" => "français",
        "hu" => "magyar",
        "it" => "italiano",
        "ja" => "日本語",
        "ko" => "한국어",
        "nl" => "Nederlands",
        "no" => "norsk",
        "pl" => "polski",
        "pt" => "português",
        "ro" => "română",
        "ru" => "русский",
        "sv" => "svenska",
        "tr" => "Türkçe",
        "uk" => "українська",
        "zh" => "中文",
        _ => return None,
    };
    Some(name)
}

/// An entry of the font index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamily {
    pub id: String,
    pub name: String,
}

impl FontFamily {
    /// Accepts an array of ids or of objects with an `id` (and optional
    /// `name`). Anything else is an [`StylerError::UnsupportedValue`].
    pub fn list_from_json(value: Value) -> Result<Vec<FontFamily>> {
        let Value::Array(entries) = value else {
            return Err(StylerError::UnsupportedValue(
                "font index must be an array".into(),
            ));
        };
        entries
            .into_iter()
            .map(|entry| match entry {
                Value::String(id) => Ok(FontFamily::from_id(id)),
                Value::Object(object) => {
                    let id = object
                        .get("id")
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            StylerError::UnsupportedValue("font entry without id".into())
                        })?
                        .to_string();
                    match object.get("name").and_then(Value::as_str) {
                        Some(name) => Ok(FontFamily {
                            id,
                            name: name.to_string(),
                        }),
                        None => Ok(FontFamily::from_id(id)),
                    }
                }
                other => Err(StylerError::UnsupportedValue(format!(
                    "font entry {other}"
                ))),
            })
            .collect()
    }

    /// `noto_sans_bold` → `Noto Sans Bold`.
    pub fn from_id(id: String) -> Self {
        let name = id
            .split(['_', '-'])
            .filter(|w| !w.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self { id, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tile_json(value: Value) -> TileJson {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_languages_from_fields() {
        let tiles = tile_json(json!({
            "vector_layers": [
                { "id": "place_labels", "fields": { "name": "String", "name_de": "String", "name_en": "String" } },
                { "id": "streets", "fields": { "name_en": "String", "name_xx": "String", "name_long": "String" } }
            ]
        }));
        assert_eq!(
            tiles.languages(),
            vec![
                ("local".to_string(), "".to_string()),
                ("Deutsch".to_string(), "de".to_string()),
                ("English".to_string(), "en".to_string()),
                ("xx".to_string(), "xx".to_string()),
            ]
        );
    }

    #[test]
    fn test_languages_without_vector_layers() {
        let tiles = tile_json(json!({ "name": "raster" }));
        assert_eq!(tiles.languages(), vec![("local".to_string(), String::new())]);
    }

    #[test]
    fn test_language_code_pattern() {
        assert_eq!(language_code("name_de"), Some("de"));
        assert_eq!(language_code("name_d"), None);
        assert_eq!(language_code("name_deu"), None);
        assert_eq!(language_code("xname_de"), None);
        assert_eq!(language_code("name_d-"), None);
    }

    #[test]
    fn test_font_index_formats() {
        let fonts = FontFamily::list_from_json(json!([
            "noto_sans_regular",
            { "id": "fira_sans_bold", "name": "Fira Sans Bold" }
        ]))
        .unwrap();
        assert_eq!(fonts[0].name, "Noto Sans Regular");
        assert_eq!(fonts[1].id, "fira_sans_bold");
        assert!(FontFamily::list_from_json(json!({ "fonts": [] })).is_err());
        assert!(FontFamily::list_from_json(json!([42])).is_err());
    }

    #[test]
    fn test_http_error_message_names_url_and_status() {
        let err = StylerError::Http {
            url: "https://example.com/tiles.json".into(),
            status: "404 Not Found".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch JSON from https://example.com/tiles.json: 404 Not Found"
        );
    }
}
