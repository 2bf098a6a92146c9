#![deny(unsafe_code)]

use std::fmt;

use serde_json::Value as JsonValue;

/// A single field value as seen by the table engine and the import pipeline.
///
/// `List` stands in for any non-primitive value (nested arrays/objects, or
/// rendered composite content). Search ignores it and export flattens it to
/// its textual content.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "JsonValue", into = "JsonValue")]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<CellValue>),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for string, number and boolean values.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Number(_) | Self::Text(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Stringified primitive, or `None` for null and non-primitive values.
    pub fn primitive_text(&self) -> Option<String> {
        match self {
            Self::Bool(flag) => Some(flag.to_string()),
            Self::Number(number) => Some(format_number(*number)),
            Self::Text(text) => Some(text.clone()),
            Self::Null | Self::List(_) => None,
        }
    }

    /// Textual content used for export: primitives stringified, lists
    /// flattened, null as empty string.
    pub fn display_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::List(items) => items.iter().map(Self::display_text).collect(),
            other => other.primitive_text().unwrap_or_default(),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::from(self.clone())
    }
}

/// Integral values print without a fractional part (`30`, not `30.0`).
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.is_finite() && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

impl From<JsonValue> for CellValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(flag) => Self::Bool(flag),
            JsonValue::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            JsonValue::String(text) => Self::Text(text),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            JsonValue::Object(map) => Self::List(map.into_iter().map(|(_, v)| Self::from(v)).collect()),
        }
    }
}

impl From<CellValue> for JsonValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Null => JsonValue::Null,
            CellValue::Bool(flag) => JsonValue::Bool(flag),
            CellValue::Number(number) => {
                serde_json::Number::from_f64(number).map_or(JsonValue::Null, JsonValue::Number)
            }
            CellValue::Text(text) => JsonValue::String(text),
            CellValue::List(items) => {
                JsonValue::Array(items.into_iter().map(JsonValue::from).collect())
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<V: Into<CellValue>> From<Option<V>> for CellValue {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_stringify_like_display_values() {
        assert_eq!(CellValue::Number(30.0).primitive_text().as_deref(), Some("30"));
        assert_eq!(CellValue::Number(2.5).primitive_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Bool(false).primitive_text().as_deref(), Some("false"));
        assert_eq!(CellValue::Null.primitive_text(), None);
    }

    #[test]
    fn lists_flatten_to_text() {
        let value = CellValue::List(vec![
            CellValue::from("Due "),
            CellValue::List(vec![CellValue::Number(3.0)]),
            CellValue::Null,
        ]);
        assert_eq!(value.display_text(), "Due 3");
        assert!(!value.is_primitive());
    }

    #[test]
    fn json_objects_become_lists() {
        let value = CellValue::from(serde_json::json!({ "a": "x", "b": 1 }));
        assert_eq!(
            value,
            CellValue::List(vec![CellValue::from("x"), CellValue::Number(1.0)])
        );
    }
}
