//! Typed field bindings.
//!
//! Each [`FieldKind`] knows how its row looks ([`render`]), how a stored
//! option value is displayed ([`apply_value`]) and how user input turns back
//! into a stored value ([`read_value`]).

use crate::core::color::Color;
use crate::core::options::{OptionPath, OptionValue};
use crate::{Result, StylerError};
use serde::{Deserialize, Serialize};

/// The closed set of field kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldKind {
    Checkbox,
    /// Real number in `[min, max]`, shown on a control scaled by `scale`
    /// (e.g. `scale = 100` exposes two decimals on an integer slider).
    Number { min: f64, max: f64, scale: f64 },
    Color,
    /// Ordered `(label, token)` pairs, both taken literally.
    Select { options: Vec<(String, String)> },
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Checkbox => "checkbox",
            Self::Number { .. } => "number",
            Self::Color => "color",
            Self::Select { .. } => "select",
        }
    }
}

/// A declared field: what to edit and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub kind: FieldKind,
    /// Path relative to the owning list's scope.
    #[serde(with = "path_serde")]
    pub path: OptionPath,
    pub title: String,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, path: impl Into<OptionPath>, title: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            title: title.into(),
        }
    }

    pub fn checkbox(path: &str, title: &str) -> Self {
        Self::new(FieldKind::Checkbox, path, title)
    }

    pub fn number(path: &str, title: &str, min: f64, max: f64, scale: f64) -> Self {
        let scale = if scale > 0.0 {
            scale
        } else {
            log::warn!("field '{path}': non-positive scale {scale}, using 1");
            1.0
        };
        Self::new(FieldKind::Number { min, max, scale }, path, title)
    }

    pub fn color(path: &str, title: &str) -> Self {
        Self::new(FieldKind::Color, path, title)
    }

    pub fn select<L, T>(path: &str, title: &str, options: impl IntoIterator<Item = (L, T)>) -> Self
    where
        L: Into<String>,
        T: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(label, token)| (label.into(), token.into()))
            .collect();
        Self::new(FieldKind::Select { options }, path, title)
    }
}

mod path_serde {
    use crate::core::options::OptionPath;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(path: &OptionPath, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(path)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<OptionPath, D::Error> {
        let text = String::deserialize(d)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// An entry of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectEntry {
    pub label: String,
    pub token: String,
}

/// Widget shape a surface has to build for a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlKind {
    Checkbox,
    Range { min: f64, max: f64, step: f64 },
    Color,
    Select { entries: Vec<SelectEntry> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSpec {
    pub title: String,
    /// Kind name, usable as a CSS class.
    pub class: String,
    pub kind: ControlKind,
}

/// What a control displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlValue {
    Checked(bool),
    Range(f64),
    Text(String),
}

/// Outcome of pushing a stored value into a control.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub control: ControlValue,
    /// Value the options tree should hold afterwards; `None` leaves it alone.
    pub stored: Option<OptionValue>,
    /// Swatch background for color rows.
    pub swatch: Option<String>,
}

pub fn render(descriptor: &FieldDescriptor) -> ControlSpec {
    let kind = match &descriptor.kind {
        FieldKind::Checkbox => ControlKind::Checkbox,
        FieldKind::Number { min, max, scale } => ControlKind::Range {
            min: min * scale,
            max: max * scale,
            step: 1.0,
        },
        FieldKind::Color => ControlKind::Color,
        FieldKind::Select { options } => ControlKind::Select {
            entries: options
                .iter()
                .map(|(label, token)| SelectEntry {
                    label: label.clone(),
                    token: token.clone(),
                })
                .collect(),
        },
    };
    ControlSpec {
        title: descriptor.title.clone(),
        class: descriptor.kind.name().to_string(),
        kind,
    }
}

/// Display `value` in a control of `kind`.
///
/// Numbers are clamped to `[min, max]` before scaling and the clamped value
/// is what gets stored.
pub fn apply_value(kind: &FieldKind, value: Option<&OptionValue>) -> Applied {
    match kind {
        FieldKind::Checkbox => {
            let checked = value.and_then(OptionValue::as_bool);
            Applied {
                control: ControlValue::Checked(checked.unwrap_or(false)),
                stored: checked.map(OptionValue::Bool),
                swatch: None,
            }
        }
        FieldKind::Number { min, max, scale } => match value.and_then(OptionValue::as_f64) {
            Some(v) => {
                let clamped = v.max(*min).min(*max);
                Applied {
                    control: ControlValue::Range(clamped * scale),
                    stored: Some(OptionValue::Number(clamped)),
                    swatch: None,
                }
            }
            None => Applied {
                control: ControlValue::Range(min * scale),
                stored: None,
                swatch: None,
            },
        },
        FieldKind::Color => match value.and_then(OptionValue::as_str) {
            Some(raw) => {
                let css = Color::parse(raw)
                    .map(|c| c.to_hex())
                    .unwrap_or_else(|_| raw.to_string());
                Applied {
                    control: ControlValue::Text(css.clone()),
                    stored: value.cloned(),
                    swatch: Some(css),
                }
            }
            None => Applied {
                control: ControlValue::Text(String::new()),
                stored: None,
                swatch: None,
            },
        },
        FieldKind::Select { .. } => {
            let token = value.and_then(OptionValue::as_str);
            Applied {
                control: ControlValue::Text(token.unwrap_or_default().to_string()),
                stored: token.map(OptionValue::from),
                swatch: None,
            }
        }
    }
}

/// Parse a control's display value back into a stored value.
///
/// Numbers are divided by `scale` and deliberately not clamped: raw control
/// input is trusted.
pub fn read_value(kind: &FieldKind, control: &ControlValue) -> Result<OptionValue> {
    match (kind, control) {
        (FieldKind::Checkbox, ControlValue::Checked(checked)) => Ok(OptionValue::Bool(*checked)),
        (FieldKind::Number { scale, .. }, ControlValue::Range(raw)) => {
            Ok(OptionValue::Number(raw / scale))
        }
        (FieldKind::Number { scale, .. }, ControlValue::Text(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(|v| OptionValue::Number(v / scale))
            .map_err(|_| StylerError::UnsupportedValue(format!("'{raw}' is not a number"))),
        (FieldKind::Color, ControlValue::Text(raw)) => Ok(Color::parse(raw)?.into()),
        (FieldKind::Select { .. }, ControlValue::Text(token)) => Ok(OptionValue::from(token.as_str())),
        (kind, control) => Err(StylerError::UnsupportedValue(format!(
            "{} field cannot read {:?}",
            kind.name(),
            control
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saturate() -> FieldKind {
        FieldKind::Number {
            min: -1.0,
            max: 1.0,
            scale: 100.0,
        }
    }

    #[test]
    fn test_render_scales_range_bounds() {
        let spec = render(&FieldDescriptor::number("saturate", "saturate", -1.0, 1.0, 100.0));
        assert_eq!(
            spec.kind,
            ControlKind::Range {
                min: -100.0,
                max: 100.0,
                step: 1.0
            }
        );
        assert_eq!(spec.class, "number");
    }

    #[test]
    fn test_number_apply_clamps_and_scales() {
        let kind = saturate();
        for (input, visual) in [(0.25, 25.0), (5.0, 100.0), (-3.0, -100.0)] {
            let applied = apply_value(&kind, Some(&OptionValue::Number(input)));
            assert_eq!(applied.control, ControlValue::Range(visual));
        }
        let applied = apply_value(&kind, Some(&OptionValue::Number(5.0)));
        assert_eq!(applied.stored, Some(OptionValue::Number(1.0)));
    }

    #[test]
    fn test_number_read_inverts_apply_in_range() {
        let kind = saturate();
        for v in [-1.0, -0.5, 0.0, 0.25, 0.5, 1.0] {
            let applied = apply_value(&kind, Some(&OptionValue::Number(v)));
            assert_eq!(
                read_value(&kind, &applied.control).unwrap(),
                OptionValue::Number(v)
            );
        }
        let applied = apply_value(&kind, Some(&OptionValue::Number(7.0)));
        assert_eq!(
            read_value(&kind, &applied.control).unwrap(),
            OptionValue::Number(1.0)
        );
    }

    #[test]
    fn test_number_read_does_not_clamp() {
        let kind = saturate();
        assert_eq!(
            read_value(&kind, &ControlValue::Range(250.0)).unwrap(),
            OptionValue::Number(2.5)
        );
        assert_eq!(
            read_value(&kind, &ControlValue::Text("-50".into())).unwrap(),
            OptionValue::Number(-0.5)
        );
    }

    #[test]
    fn test_color_read_parses_and_normalizes() {
        let value = read_value(&FieldKind::Color, &ControlValue::Text("#AADDFF".into())).unwrap();
        assert_eq!(value, OptionValue::from("#aaddff"));
        assert!(read_value(&FieldKind::Color, &ControlValue::Text("nope".into())).is_err());
    }

    #[test]
    fn test_color_apply_sets_swatch() {
        let applied = apply_value(&FieldKind::Color, Some(&OptionValue::from("F00")));
        assert_eq!(applied.control, ControlValue::Text("#ff0000".into()));
        assert_eq!(applied.swatch.as_deref(), Some("#ff0000"));
        assert_eq!(applied.stored, Some(OptionValue::from("F00")));
    }

    #[test]
    fn test_select_is_literal() {
        let kind = FieldKind::Select {
            options: vec![("local".into(), "".into()), ("German".into(), "de".into())],
        };
        assert_eq!(
            apply_value(&kind, None).control,
            ControlValue::Text(String::new())
        );
        assert_eq!(
            read_value(&kind, &ControlValue::Text(" de".into())).unwrap(),
            OptionValue::from(" de")
        );
    }

    #[test]
    fn test_checkbox() {
        let applied = apply_value(&FieldKind::Checkbox, Some(&OptionValue::Bool(true)));
        assert_eq!(applied.control, ControlValue::Checked(true));
        assert_eq!(
            read_value(&FieldKind::Checkbox, &ControlValue::Checked(false)).unwrap(),
            OptionValue::Bool(false)
        );
    }

    #[test]
    fn test_mismatched_control_is_an_error() {
        assert!(matches!(
            read_value(&FieldKind::Checkbox, &ControlValue::Range(1.0)),
            Err(StylerError::UnsupportedValue(_))
        ));
    }
}
