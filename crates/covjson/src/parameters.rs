//! Parameter metadata carried by CoverageJSON documents.
//!
//! A parameter names a variable the ranges hold values for. Continuous
//! parameters carry a unit; categorical ones list their categories in the
//! observed property and map category ids to range codes through
//! `categoryEncoding`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Parameter {
    #[serde(rename = "type", default = "parameter_type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,

    #[serde(rename = "observedProperty", default)]
    pub observed_property: ObservedProperty,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    /// Category id (or colour) to the code(s) stored in ranges, in
    /// document order.
    #[serde(rename = "categoryEncoding", default, skip_serializing_if = "Option::is_none")]
    pub category_encoding: Option<IndexMap<String, EncodingValue>>,
}

fn parameter_type() -> String {
    "Parameter".to_string()
}

impl Parameter {
    /// Continuous parameter whose observed property is labelled `label`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            kind: parameter_type(),
            id: None,
            label: None,
            description: None,
            observed_property: ObservedProperty {
                label: Some(LocalizedText::Plain(label.into())),
                ..ObservedProperty::default()
            },
            unit: None,
            category_encoding: None,
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Declares `categories`, each stored in ranges under its paired code.
    pub fn with_categories(mut self, categories: Vec<(Category, f64)>) -> Self {
        let encoding = categories
            .iter()
            .map(|(category, code)| (category.id.clone(), EncodingValue::Single(*code)))
            .collect();
        self.observed_property.categories =
            Some(categories.into_iter().map(|(category, _)| category).collect());
        self.category_encoding = Some(encoding);
        self
    }

    pub fn is_categorical(&self) -> bool {
        self.category_encoding.is_some() || self.observed_property.categories.is_some()
    }

    /// Unit label, falling back to the unit symbol.
    pub fn unit_label(&self) -> Option<&str> {
        let unit = self.unit.as_ref()?;
        unit.label
            .as_ref()
            .map(LocalizedText::text)
            .or_else(|| unit.symbol.as_ref().map(UnitSymbol::value))
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.observed_property
            .categories
            .as_deref()?
            .iter()
            .find(|c| c.id == id)
    }

    /// Encoding key whose code(s) include `value`.
    pub fn encoding_for_value(&self, value: f64) -> Option<&str> {
        self.category_encoding
            .as_ref()?
            .iter()
            .find_map(|(key, codes)| codes.contains(value).then_some(key.as_str()))
    }
}

/// One code or a list of codes in a `categoryEncoding` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EncodingValue {
    Single(f64),
    Many(Vec<f64>),
}

impl EncodingValue {
    pub fn contains(&self, value: f64) -> bool {
        self.codes().contains(&value)
    }

    pub fn first(&self) -> Option<f64> {
        self.codes().first().copied()
    }

    fn codes(&self) -> &[f64] {
        match self {
            EncodingValue::Single(code) => std::slice::from_ref(code),
            EncodingValue::Many(codes) => codes,
        }
    }
}

/// Text given either as a bare string or as a language map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum LocalizedText {
    Plain(String),
    /// Language tag to text; iteration follows document order.
    ByLanguage(IndexMap<String, String>),
}

impl LocalizedText {
    /// English text, else the first language present.
    pub fn text(&self) -> &str {
        match self {
            LocalizedText::Plain(text) => text,
            LocalizedText::ByLanguage(map) => map
                .get("en")
                .or_else(|| map.values().next())
                .map_or("", String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ObservedProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<Category>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,

    /// `#RRGGBB`.
    #[serde(rename = "preferredColor", default, skip_serializing_if = "Option::is_none")]
    pub preferred_color: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<String>, label: &str) -> Self {
        Self {
            id: id.into(),
            label: Some(LocalizedText::Plain(label.to_string())),
            description: None,
            preferred_color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.preferred_color = Some(color.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LocalizedText>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<UnitSymbol>,
}

impl Unit {
    pub fn new(label: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            label: Some(LocalizedText::Plain(label.into())),
            symbol: Some(UnitSymbol::Plain(symbol.into())),
        }
    }

    pub fn from_symbol(symbol: impl Into<String>) -> Self {
        Self {
            label: None,
            symbol: Some(UnitSymbol::Plain(symbol.into())),
        }
    }
}

/// `"K"` or `{"value": "K", "type": "<UCUM uri>"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum UnitSymbol {
    Plain(String),
    Typed {
        value: String,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        scheme: Option<String>,
    },
}

impl UnitSymbol {
    pub fn value(&self) -> &str {
        match self {
            UnitSymbol::Plain(value) | UnitSymbol::Typed { value, .. } => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_parameter_is_continuous() {
        let param = Parameter::new("Air temperature");
        assert_eq!(param.kind, "Parameter");
        assert!(!param.is_categorical());
        assert!(param.unit_label().is_none());
        assert_eq!(
            param.observed_property.label.as_ref().map(LocalizedText::text),
            Some("Air temperature")
        );
    }

    #[test]
    fn test_unit_label_falls_back_to_symbol() {
        let labelled = Parameter::new("T").with_unit(Unit::new("Kelvin", "K"));
        assert_eq!(labelled.unit_label(), Some("Kelvin"));

        let symbol_only = Parameter::new("T").with_unit(Unit::from_symbol("K"));
        assert_eq!(symbol_only.unit_label(), Some("K"));
    }

    #[test]
    fn test_with_categories_builds_encoding() {
        let param = Parameter::new("Land cover").with_categories(vec![
            (Category::new("forest", "Forest").with_color("#00ff00"), 1.0),
            (Category::new("water", "Water"), 2.0),
        ]);

        assert!(param.is_categorical());
        assert_eq!(param.encoding_for_value(2.0), Some("water"));
        assert_eq!(param.encoding_for_value(3.0), None);
        assert_eq!(
            param.category("forest").and_then(|c| c.preferred_color.as_deref()),
            Some("#00ff00")
        );
        assert!(param.category("urban").is_none());
    }

    #[test]
    fn test_colour_keyed_encoding_keeps_order() {
        let json = r##"{
            "type": "Parameter",
            "observedProperty": {"label": {"en": "Population"}},
            "categoryEncoding": {"#ffffff": 0, "#fff0f0": [100, 101]}
        }"##;
        let param: Parameter = serde_json::from_str(json).unwrap();

        assert_eq!(param.encoding_for_value(0.0), Some("#ffffff"));
        assert_eq!(param.encoding_for_value(101.0), Some("#fff0f0"));
        let encoding = param.category_encoding.unwrap();
        assert_eq!(encoding.keys().collect::<Vec<_>>(), vec!["#ffffff", "#fff0f0"]);
        assert_eq!(encoding["#fff0f0"].first(), Some(100.0));
    }

    #[test]
    fn test_localized_text_without_english() {
        let text: LocalizedText = serde_json::from_str(r#"{"de": "Temperatur", "fr": "Température"}"#).unwrap();
        assert_eq!(text.text(), "Temperatur");
    }

    #[test]
    fn test_typed_unit_symbol() {
        let json = r#"{"symbol": {"value": "K", "type": "http://www.opengis.net/def/uom/UCUM/"}}"#;
        let unit: Unit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.symbol.as_ref().map(UnitSymbol::value), Some("K"));
    }
}
