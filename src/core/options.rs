//! Type-erased style options.
//!
//! Style builders are configured with arbitrarily nested option objects.
//! [`OptionsTree`] keeps them as an ordered map of [`OptionValue`]s so the
//! form engine and the differ can walk any style's options without knowing
//! its schema. Key order is preserved because rows are laid out in the order
//! the defaults declare them.

use crate::{Result, StylerError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::str::FromStr;

/// Largest integer an `f64` represents exactly; used to print whole numbers
/// without a fractional part.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Explicit JSON `null`. Never produced by the form engine.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Opaque list of primitives, compared as a whole.
    List(Vec<OptionValue>),
    Tree(OptionsTree),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tree(&self) -> Option<&OptionsTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    pub fn as_tree_mut(&mut self) -> Option<&mut OptionsTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// `null` and the empty string carry no information for export.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Short type name used in error messages and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Tree(_) => "tree",
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => number_to_json(*n),
            Self::Text(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Tree(tree) => tree.to_json(),
        }
    }

    /// Convert a JSON value, failing loudly on shapes the engine cannot
    /// represent (lists holding lists or objects).
    pub fn try_from_json(value: Value) -> Result<Self> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n.as_f64().ok_or_else(|| {
                StylerError::UnsupportedValue(format!("number {n} is not representable"))
            })?),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Array(_) | Value::Object(_) => {
                            Err(StylerError::UnsupportedValue(format!(
                                "lists may only hold primitives, found {item}"
                            )))
                        }
                        other => Self::try_from_json(other),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(map) => Self::Tree(OptionsTree::try_from_map(map)?),
        })
    }
}

fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<OptionsTree> for OptionValue {
    fn from(value: OptionsTree) -> Self {
        Self::Tree(value)
    }
}

impl<T: Into<OptionValue>> From<Vec<T>> for OptionValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

/// Ordered mapping from option keys to values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct OptionsTree {
    entries: Vec<(String, OptionValue)>,
}

impl OptionsTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut OptionValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a value. Replacing keeps the key's position.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<OptionValue>,
    ) -> Option<OptionValue> {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Nested tree stored under `key`, if any.
    pub fn subtree(&self, key: &str) -> Option<&OptionsTree> {
        self.get(key).and_then(OptionValue::as_tree)
    }

    pub fn get_path(&self, path: &OptionPath) -> Option<&OptionValue> {
        let (last, parents) = path.segments().split_last()?;
        let mut tree = self;
        for segment in parents {
            tree = tree.subtree(segment)?;
        }
        tree.get(last)
    }

    /// The tree a path points at; the empty path is `self`.
    pub fn tree_at(&self, path: &OptionPath) -> Option<&OptionsTree> {
        if path.is_root() {
            return Some(self);
        }
        self.get_path(path).and_then(OptionValue::as_tree)
    }

    /// Write `value` at `path`, creating missing intermediate trees.
    ///
    /// Walking through an existing non-tree value is an error rather than a
    /// silent overwrite.
    pub fn set_path(&mut self, path: &OptionPath, value: impl Into<OptionValue>) -> Result<()> {
        let (last, parents) = path
            .segments()
            .split_last()
            .ok_or_else(|| StylerError::InvalidPath("empty path".to_string()))?;
        let mut tree = self;
        for segment in parents {
            if !tree.contains_key(segment) {
                tree.insert(segment.clone(), OptionsTree::new());
            }
            tree = tree
                .get_mut(segment)
                .and_then(OptionValue::as_tree_mut)
                .ok_or_else(|| {
                    StylerError::InvalidPath(format!("{path}: '{segment}' is not a tree"))
                })?;
        }
        tree.insert(last.clone(), value);
        Ok(())
    }

    pub fn remove_path(&mut self, path: &OptionPath) -> Option<OptionValue> {
        let (last, parents) = path.segments().split_last()?;
        let mut tree = self;
        for segment in parents {
            tree = tree.get_mut(segment)?.as_tree_mut()?;
        }
        tree.remove(last)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn try_from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::try_from_map(map),
            other => Err(StylerError::UnsupportedValue(format!(
                "expected an object, found {other}"
            ))),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::try_from_json(serde_json::from_str(json)?)
    }

    fn try_from_map(map: Map<String, Value>) -> Result<Self> {
        let mut tree = Self::new();
        for (key, value) in map {
            tree.entries.push((key, OptionValue::try_from_json(value)?));
        }
        Ok(tree)
    }
}

/// Trees are equal when they hold the same keys with equal values,
/// regardless of key order.
impl PartialEq for OptionsTree {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl TryFrom<Value> for OptionsTree {
    type Error = StylerError;

    fn try_from(value: Value) -> Result<Self> {
        Self::try_from_json(value)
    }
}

impl From<OptionsTree> for Value {
    fn from(tree: OptionsTree) -> Self {
        tree.to_json()
    }
}

impl<K: Into<String>, V: Into<OptionValue>> FromIterator<(K, V)> for OptionsTree {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        for (key, value) in iter {
            tree.insert(key, value);
        }
        tree
    }
}

/// Build an [`OptionsTree`] from `key => value` pairs.
///
/// ```rust
/// use maplet_styler::options_tree;
///
/// let tree = options_tree! {
///     "language" => "de",
///     "recolor" => options_tree! { "rotate" => 90.0 },
/// };
/// assert_eq!(tree.len(), 2);
/// ```
#[macro_export]
macro_rules! options_tree {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut tree = $crate::core::options::OptionsTree::new();
        $(tree.insert($key, $value);)*
        tree
    }};
}

/// Dotted key path into an [`OptionsTree`], e.g. `fonts.regular`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct OptionPath(Vec<String>);

impl OptionPath {
    /// The empty path, addressing the tree itself.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, used as the default row title.
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn join(&self, other: &OptionPath) -> OptionPath {
        OptionPath(self.0.iter().chain(other.0.iter()).cloned().collect())
    }

    pub fn child(&self, key: impl Into<String>) -> OptionPath {
        let mut segments = self.0.clone();
        segments.push(key.into());
        OptionPath(segments)
    }
}

impl FromStr for OptionPath {
    type Err = StylerError;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(StylerError::InvalidPath(s.to_string()));
        }
        Ok(Self(segments))
    }
}

/// Infallible conversion for literal paths; empty segments are dropped.
impl From<&str> for OptionPath {
    fn from(s: &str) -> Self {
        Self(
            s.split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl fmt::Display for OptionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_keeps_position_on_replace() {
        let mut tree = options_tree! { "a" => 1.0, "b" => 2.0, "c" => 3.0 };
        assert_eq!(tree.insert("b", 20.0), Some(OptionValue::Number(2.0)));
        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_json_preserves_key_order() {
        let tree = OptionsTree::from_json_str(r#"{"z": 1, "a": {"y": true, "b": "x"}}"#).unwrap();
        let keys: Vec<_> = tree.keys().collect();
        assert_eq!(keys, vec!["z", "a"]);
        let inner: Vec<_> = tree.subtree("a").unwrap().keys().collect();
        assert_eq!(inner, vec!["y", "b"]);
    }

    #[test]
    fn test_nested_lists_are_rejected() {
        let err = OptionsTree::try_from_json(json!({ "tiles": [["a"]] })).unwrap_err();
        assert!(matches!(err, StylerError::UnsupportedValue(_)));

        let err = OptionsTree::try_from_json(json!({ "tiles": [{ "url": "a" }] })).unwrap_err();
        assert!(matches!(err, StylerError::UnsupportedValue(_)));
    }

    #[test]
    fn test_whole_numbers_serialize_without_fraction() {
        let tree = options_tree! { "rotate" => 90.0, "gamma" => 0.5 };
        assert_eq!(tree.to_json(), json!({ "rotate": 90, "gamma": 0.5 }));
    }

    #[test]
    fn test_set_path_creates_intermediate_trees() {
        let mut tree = OptionsTree::new();
        tree.set_path(&"fonts.regular".into(), "noto_sans_regular")
            .unwrap();
        assert_eq!(
            tree.get_path(&"fonts.regular".into()),
            Some(&OptionValue::from("noto_sans_regular"))
        );
    }

    #[test]
    fn test_set_path_refuses_to_walk_through_leaf() {
        let mut tree = options_tree! { "language" => "de" };
        let err = tree.set_path(&"language.code".into(), "en").unwrap_err();
        assert!(matches!(err, StylerError::InvalidPath(_)));
        assert_eq!(tree.get("language"), Some(&OptionValue::from("de")));
    }

    #[test]
    fn test_equality_ignores_key_order() {
        let a = options_tree! { "x" => 1.0, "y" => true };
        let b = options_tree! { "y" => true, "x" => 1.0 };
        assert_eq!(a, b);
    }

    #[test]
    fn test_path_parsing() {
        assert!("".parse::<OptionPath>().unwrap().is_root());
        assert!("a..b".parse::<OptionPath>().is_err());
        let path: OptionPath = "colors.water".parse().unwrap();
        assert_eq!(path.leaf(), Some("water"));
        assert_eq!(path.to_string(), "colors.water");
    }

    #[test]
    fn test_remove_path() {
        let mut tree = options_tree! { "colors" => options_tree! { "water" => "#00f" } };
        assert_eq!(
            tree.remove_path(&"colors.water".into()),
            Some(OptionValue::from("#00f"))
        );
        assert!(tree.subtree("colors").unwrap().is_empty());
    }
}
