//! Color values and global recolor transforms.

use crate::core::options::{OptionValue, OptionsTree};
use crate::{Result, StylerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB color with straight alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// Opacity in `[0, 1]`.
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self {
            r,
            g,
            b,
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` (the `#` is optional),
    /// `rgb(r, g, b)` and `rgba(r, g, b, a)`.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        let invalid = || StylerError::InvalidColor(input.to_string());

        if let Some(args) = function_args(text, "rgba").or_else(|| function_args(text, "rgb")) {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            if parts.len() != 3 && parts.len() != 4 {
                return Err(invalid());
            }
            let channel = |s: &str| -> Result<u8> {
                let v: f64 = s.parse().map_err(|_| invalid())?;
                Ok(v.round().clamp(0.0, 255.0) as u8)
            };
            let alpha = match parts.get(3) {
                Some(s) => s.parse::<f64>().map_err(|_| invalid())?,
                None => 1.0,
            };
            return Ok(Self::rgba(
                channel(parts[0])?,
                channel(parts[1])?,
                channel(parts[2])?,
                alpha,
            ));
        }

        let hex = text.strip_prefix('#').unwrap_or(text);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let parsed = match hex.len() {
            3 => (nibble(0), nibble(1), nibble(2), Ok(255)),
            4 => (nibble(0), nibble(1), nibble(2), nibble(3)),
            6 => (byte(0), byte(2), byte(4), Ok(255)),
            8 => (byte(0), byte(2), byte(4), byte(6)),
            _ => return Err(invalid()),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self::rgba(r, g, b, a as f64 / 255.0)),
            _ => Err(invalid()),
        }
    }

    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            let alpha = (self.a * 255.0).round() as u8;
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, alpha)
        }
    }

    fn to_hsl(self) -> (f64, f64, f64) {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if max == min {
            return (0.0, 0.0, l);
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        (h * 60.0, s, l)
    }

    fn from_hsl(h: f64, s: f64, l: f64, a: f64) -> Self {
        let h = h.rem_euclid(360.0) / 360.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = to_channel(l);
            return Self::rgba(v, v, v, a);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Self::rgba(
            to_channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            to_channel(hue_to_rgb(p, q, h)),
            to_channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
            a,
        )
    }

    fn map_channels(self, f: impl Fn(f64) -> f64) -> Self {
        let apply = |c: u8| f(c as f64).round().clamp(0.0, 255.0) as u8;
        Self::rgba(apply(self.r), apply(self.g), apply(self.b), self.a)
    }

    fn mix(self, other: Color, amount: f64) -> Self {
        let amount = amount.clamp(0.0, 1.0);
        let lerp = |a: u8, b: u8| {
            (a as f64 + (b as f64 - a as f64) * amount)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Self::rgba(
            lerp(self.r, other.r),
            lerp(self.g, other.g),
            lerp(self.b, other.b),
            self.a,
        )
    }
}

fn function_args<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let lower = text.to_ascii_lowercase();
    if !lower.starts_with(name) {
        return None;
    }
    text[name.len()..]
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

impl FromStr for Color {
    type Err = StylerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for OptionValue {
    fn from(color: Color) -> Self {
        OptionValue::Text(color.to_hex())
    }
}

/// Global recoloring applied to every color of a style.
///
/// Field names follow the `recolor` options subtree.
#[derive(Debug, Clone, PartialEq)]
pub struct Recolor {
    pub invert_brightness: bool,
    /// Hue rotation in degrees.
    pub rotate: f64,
    /// Relative saturation change in `[-1, 1]`.
    pub saturate: f64,
    pub gamma: f64,
    pub contrast: f64,
    /// Additive brightness in `[-1, 1]`.
    pub brightness: f64,
    pub tint: f64,
    pub tint_color: Color,
    pub blend: f64,
    pub blend_color: Color,
}

impl Default for Recolor {
    fn default() -> Self {
        Self {
            invert_brightness: false,
            rotate: 0.0,
            saturate: 0.0,
            gamma: 1.0,
            contrast: 1.0,
            brightness: 0.0,
            tint: 0.0,
            tint_color: Color::rgb(255, 0, 0),
            blend: 0.0,
            blend_color: Color::BLACK,
        }
    }
}

impl Recolor {
    /// Default `recolor` subtree, in panel order.
    pub fn default_options() -> OptionsTree {
        let defaults = Self::default();
        let mut tree = OptionsTree::new();
        tree.insert("invertBrightness", defaults.invert_brightness);
        tree.insert("rotate", defaults.rotate);
        tree.insert("saturate", defaults.saturate);
        tree.insert("gamma", defaults.gamma);
        tree.insert("contrast", defaults.contrast);
        tree.insert("brightness", defaults.brightness);
        tree.insert("tint", defaults.tint);
        tree.insert("tintColor", defaults.tint_color);
        tree.insert("blend", defaults.blend);
        tree.insert("blendColor", defaults.blend_color);
        tree
    }

    /// Read a `recolor` subtree. Missing or mistyped entries keep their
    /// defaults; unparsable colors are an error.
    pub fn from_options(tree: &OptionsTree) -> Result<Self> {
        let mut recolor = Self::default();
        let number = |key: &str, fallback: f64| {
            tree.get(key).and_then(OptionValue::as_f64).unwrap_or(fallback)
        };
        let color = |key: &str, fallback: Color| -> Result<Color> {
            match tree.get(key).and_then(OptionValue::as_str) {
                Some(text) if !text.is_empty() => Color::parse(text),
                _ => Ok(fallback),
            }
        };
        recolor.invert_brightness = tree
            .get("invertBrightness")
            .and_then(OptionValue::as_bool)
            .unwrap_or(recolor.invert_brightness);
        recolor.rotate = number("rotate", recolor.rotate);
        recolor.saturate = number("saturate", recolor.saturate);
        recolor.gamma = number("gamma", recolor.gamma);
        recolor.contrast = number("contrast", recolor.contrast);
        recolor.brightness = number("brightness", recolor.brightness);
        recolor.tint = number("tint", recolor.tint);
        recolor.tint_color = color("tintColor", recolor.tint_color)?;
        recolor.blend = number("blend", recolor.blend);
        recolor.blend_color = color("blendColor", recolor.blend_color)?;
        Ok(recolor)
    }

    pub fn is_identity(&self) -> bool {
        !self.invert_brightness
            && self.rotate == 0.0
            && self.saturate == 0.0
            && self.gamma == 1.0
            && self.contrast == 1.0
            && self.brightness == 0.0
            && self.tint == 0.0
            && self.blend == 0.0
    }

    pub fn apply(&self, color: Color) -> Color {
        if self.is_identity() {
            return color;
        }
        let mut c = color;

        if self.invert_brightness {
            let (h, s, l) = c.to_hsl();
            c = Color::from_hsl(h, s, 1.0 - l, c.a);
        }
        if self.rotate != 0.0 || self.saturate != 0.0 {
            let (h, s, l) = c.to_hsl();
            c = Color::from_hsl(h + self.rotate, s * (1.0 + self.saturate), l, c.a);
        }
        if self.gamma != 1.0 && self.gamma > 0.0 {
            let gamma = self.gamma;
            c = c.map_channels(|v| 255.0 * (v / 255.0).powf(gamma));
        }
        if self.contrast != 1.0 {
            let contrast = self.contrast;
            c = c.map_channels(|v| (v - 127.5) * contrast + 127.5);
        }
        if self.brightness != 0.0 {
            let offset = self.brightness * 255.0;
            c = c.map_channels(|v| v + offset);
        }
        if self.tint > 0.0 {
            // Keep lightness, move hue and saturation toward the tint color.
            let (_, _, l) = c.to_hsl();
            let (th, ts, _) = self.tint_color.to_hsl();
            c = c.mix(Color::from_hsl(th, ts, l, c.a), self.tint);
        }
        if self.blend > 0.0 {
            c = c.mix(self.blend_color, self.blend);
        }
        c
    }
}
