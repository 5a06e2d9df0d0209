//! Renderer descriptions derived from parameter metadata and values.
//!
//! Categorical parameters get one class per distinct value, labelled and
//! coloured from the observed property's categories. Continuous
//! parameters get a colour ramp stretched over the value range.

use std::fmt;

use covjson::Parameter;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LayerConfig;
use crate::error::{LayerError, LayerResult};

/// Label of the trailing category for missing values.
pub const NO_DATA_LABEL: &str = "No data";

/// An RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA`.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !matches!(hex.len(), 6 | 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 255 },
        })
    }

    /// Lowercase `#rrggbb`, with an alpha pair when not opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Linear interpolation between two colours.
    pub fn lerp(&self, other: &Color, t: f64) -> Color {
        let t = t.clamp(0.0, 1.0);
        let lerp_u8 = |a: u8, b: u8| -> u8 { ((a as f64) * (1.0 - t) + (b as f64) * t).round() as u8 };
        Color {
            r: lerp_u8(self.r, other.r),
            g: lerp_u8(self.g, other.g),
            b: lerp_u8(self.b, other.b),
            a: lerp_u8(self.a, other.a),
        }
    }

    /// Colour from hue (degrees), saturation and value in `[0, 1]`.
    fn from_hsv(h: f64, s: f64, v: f64) -> Self {
        let c = v * s;
        let hp = (h.rem_euclid(360.0)) / 60.0;
        let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = v - c;
        let to_u8 = |f: f64| ((f + m) * 255.0).round() as u8;
        Color::rgb(to_u8(r1), to_u8(g1), to_u8(b1))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&s).ok_or_else(|| format!("invalid colour `{}`", s))
    }
}

/// Colour for the category at `index` when the document names none.
///
/// Hues advance by the golden angle so neighbouring indices differ.
pub fn palette_color(index: usize) -> Color {
    const GOLDEN_ANGLE: f64 = 137.507_764;
    let saturation = if index % 2 == 0 { 0.65 } else { 0.85 };
    Color::from_hsv(index as f64 * GOLDEN_ANGLE, saturation, 0.9)
}

/// A colour at a data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub value: f64,
    pub color: Color,
}

/// One class of a categorical renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryClass {
    /// Encoded range value; `None` for the "No data" class.
    pub value: Option<f64>,
    pub label: String,
    pub color: Color,
}

/// How a layer should be drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RendererSpec {
    /// One colour per distinct value.
    Categorical { categories: Vec<CategoryClass> },

    /// Colour ramp between the smallest and largest value.
    Continuous {
        min: f64,
        max: f64,
        stops: Vec<ColorStop>,
    },

    /// Every valid value is the same.
    SingleColor { value: f64, color: Color },
}

impl RendererSpec {
    /// Colour assigned to a value; `None` when the value is not drawn.
    pub fn color_for(&self, value: Option<f64>) -> Option<Color> {
        match self {
            RendererSpec::Categorical { categories } => categories
                .iter()
                .find(|c| c.value == value)
                .map(|c| c.color),
            RendererSpec::Continuous { stops, .. } => {
                let v = value?;
                let first = stops.first()?;
                if v <= first.value {
                    return Some(first.color);
                }
                for pair in stops.windows(2) {
                    let (lo, hi) = (&pair[0], &pair[1]);
                    if v <= hi.value {
                        let t = (v - lo.value) / (hi.value - lo.value);
                        return Some(lo.color.lerp(&hi.color, t));
                    }
                }
                stops.last().map(|s| s.color)
            }
            RendererSpec::SingleColor { color, .. } => value.map(|_| *color),
        }
    }

    /// Number of categorical classes, zero for other renderers.
    pub fn category_count(&self) -> usize {
        match self {
            RendererSpec::Categorical { categories } => categories.len(),
            _ => 0,
        }
    }
}

/// Ramp used for continuous parameters, as fractions of the value range.
const CONTINUOUS_RAMP: [(f64, Color); 5] = [
    (0.0, Color::rgb(43, 131, 186)),
    (0.25, Color::rgb(171, 221, 164)),
    (0.5, Color::rgb(255, 255, 191)),
    (0.75, Color::rgb(253, 174, 97)),
    (1.0, Color::rgb(215, 25, 28)),
];

/// Builds renderer descriptions for parameters.
#[derive(Debug, Clone)]
pub struct RendererBuilder {
    add_no_data_category: bool,
    no_data_color: Color,
}

impl RendererBuilder {
    pub fn new(config: &LayerConfig) -> Self {
        Self {
            add_no_data_category: config.add_no_data_category,
            no_data_color: Color::parse_hex(&config.no_data_color)
                .unwrap_or(Color::rgb(255, 0, 255)),
        }
    }

    /// Build the renderer for `parameter` from its values.
    ///
    /// `None` entries are missing values. Fails with `EmptyRange` when no
    /// value is present.
    pub fn build(
        &self,
        name: &str,
        parameter: &Parameter,
        values: impl IntoIterator<Item = Option<f64>>,
    ) -> LayerResult<RendererSpec> {
        let mut distinct: Vec<f64> = values.into_iter().flatten().collect();
        if distinct.is_empty() {
            return Err(LayerError::EmptyRange(name.to_string()));
        }
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();

        let spec = if parameter.is_categorical() {
            self.categorical(parameter, &distinct)
        } else {
            continuous(&distinct)
        };

        debug!(
            parameter = name,
            distinct = distinct.len(),
            categories = spec.category_count(),
            "built renderer"
        );

        Ok(spec)
    }

    fn categorical(&self, parameter: &Parameter, distinct: &[f64]) -> RendererSpec {
        let mut categories: Vec<CategoryClass> = distinct
            .iter()
            .enumerate()
            .map(|(i, &value)| category_class(parameter, i, value))
            .collect();

        if self.add_no_data_category {
            categories.push(CategoryClass {
                value: None,
                label: NO_DATA_LABEL.to_string(),
                color: self.no_data_color,
            });
        }

        RendererSpec::Categorical { categories }
    }
}

fn category_class(parameter: &Parameter, index: usize, value: f64) -> CategoryClass {
    let key = parameter.encoding_for_value(value);
    let category = key.and_then(|k| parameter.category(k));

    let label = category
        .and_then(|c| c.label.as_ref())
        .map(|l| l.text().to_string())
        .or_else(|| key.map(str::to_string))
        .unwrap_or_else(|| format_value(value));

    let color = key
        .and_then(Color::parse_hex)
        .or_else(|| {
            category
                .and_then(|c| c.preferred_color.as_deref())
                .and_then(Color::parse_hex)
        })
        .unwrap_or_else(|| palette_color(index));

    CategoryClass {
        value: Some(value),
        label,
        color,
    }
}

fn continuous(distinct: &[f64]) -> RendererSpec {
    let (min, max) = (distinct[0], distinct[distinct.len() - 1]);
    if min == max {
        return RendererSpec::SingleColor {
            value: min,
            color: CONTINUOUS_RAMP[0].1,
        };
    }
    let stops = CONTINUOUS_RAMP
        .iter()
        .map(|(f, color)| ColorStop {
            value: min + (max - min) * f,
            color: *color,
        })
        .collect();
    RendererSpec::Continuous { min, max, stops }
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
