//! Row schemas.
//!
//! A [`Schema`] turns one mapped row into a typed record or a list of
//! field-level violations. [`RowSchema`] is the declarative implementation
//! loaded from import profiles: it coerces spreadsheet values (numeric text,
//! yes/no flags, serial dates), strips undeclared keys, then deserializes the
//! canonical object into the target type.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value as JsonValue};

use fleet_model::CellValue;
use fleet_model::value::format_number;

use crate::error::SchemaError;
use crate::mapping::MappedRecord;

/// One schema violation, rendered as `"<path>: <message>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub path: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Validates a mapped row into `T`.
pub trait Schema<T> {
    fn validate(&self, data: &MappedRecord) -> Result<T, Vec<FieldViolation>>;
}

impl<T, F> Schema<T> for F
where
    F: Fn(&MappedRecord) -> Result<T, Vec<FieldViolation>>,
{
    fn validate(&self, data: &MappedRecord) -> Result<T, Vec<FieldViolation>> {
        self(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Number,
    Integer,
    Boolean,
    Date,
}

/// Declarative rules for one canonical field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    pub key: String,
    pub kind: FieldKind,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub one_of: Vec<String>,
    pub pattern: Option<String>,
}

impl FieldSpec {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

#[derive(Debug, Clone)]
struct CompiledField {
    spec: FieldSpec,
    pattern: Option<Regex>,
}

/// Declarative schema over a fixed list of fields.
#[derive(Debug, Clone)]
pub struct RowSchema {
    fields: Vec<CompiledField>,
}

impl RowSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut seen = BTreeSet::new();
        let mut compiled = Vec::with_capacity(fields.len());
        for spec in fields {
            if spec.key.trim().is_empty() {
                return Err(SchemaError::EmptyFieldKey);
            }
            if !seen.insert(spec.key.clone()) {
                return Err(SchemaError::DuplicateField(spec.key));
            }
            let inverted = matches!((spec.min, spec.max), (Some(min), Some(max)) if min > max)
                || matches!((spec.min_length, spec.max_length), (Some(min), Some(max)) if min > max);
            if inverted {
                return Err(SchemaError::InvalidBounds { field: spec.key });
            }
            let pattern = match &spec.pattern {
                Some(pattern) => Some(Regex::new(pattern).map_err(|source| {
                    SchemaError::InvalidPattern {
                        field: spec.key.clone(),
                        source,
                    }
                })?),
                None => None,
            };
            compiled.push(CompiledField { spec, pattern });
        }
        Ok(Self { fields: compiled })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().map(|field| &field.spec)
    }

    /// Coerce `data` into a canonical JSON object holding only declared fields.
    pub fn coerce(&self, data: &MappedRecord) -> Result<Map<String, JsonValue>, Vec<FieldViolation>> {
        let mut object = Map::new();
        let mut violations = Vec::new();
        for field in &self.fields {
            let key = &field.spec.key;
            match field.check(data.get(key)) {
                Ok(Some(value)) => {
                    object.insert(key.clone(), value);
                }
                Ok(None) => {}
                Err(messages) => violations.extend(
                    messages
                        .into_iter()
                        .map(|message| FieldViolation::new(key.clone(), message)),
                ),
            }
        }
        if violations.is_empty() {
            Ok(object)
        } else {
            Err(violations)
        }
    }
}

impl<T: DeserializeOwned> Schema<T> for RowSchema {
    fn validate(&self, data: &MappedRecord) -> Result<T, Vec<FieldViolation>> {
        let object = self.coerce(data)?;
        serde_json::from_value(JsonValue::Object(object))
            .map_err(|e| vec![FieldViolation::new("record", e.to_string())])
    }
}

impl CompiledField {
    /// `Ok(None)` for an absent optional value.
    fn check(&self, value: Option<&CellValue>) -> Result<Option<JsonValue>, Vec<String>> {
        let Some(value) = value.filter(|value| !is_absent(value)) else {
            return if self.spec.required {
                Err(vec!["required".to_string()])
            } else {
                Ok(None)
            };
        };
        let json = match self.spec.kind {
            FieldKind::Text => JsonValue::String(self.check_text(value)?),
            FieldKind::Number => {
                let number = coerce_number(value).ok_or_else(|| vec!["expected number".to_string()])?;
                self.check_bounds(number)?;
                json_number(number).ok_or_else(|| vec!["expected number".to_string()])?
            }
            FieldKind::Integer => {
                let number = coerce_number(value)
                    .filter(|number| number.fract() == 0.0 && number.abs() < 9.0e15)
                    .ok_or_else(|| vec!["expected integer".to_string()])?;
                self.check_bounds(number)?;
                JsonValue::Number(Number::from(number as i64))
            }
            FieldKind::Boolean => {
                JsonValue::Bool(coerce_bool(value).ok_or_else(|| vec!["expected boolean".to_string()])?)
            }
            FieldKind::Date => {
                let date = coerce_date(value).ok_or_else(|| vec!["expected date".to_string()])?;
                JsonValue::String(date.format("%Y-%m-%d").to_string())
            }
        };
        Ok(Some(json))
    }

    fn check_text(&self, value: &CellValue) -> Result<String, Vec<String>> {
        let text = value.display_text();
        let spec = &self.spec;
        let mut messages = Vec::new();
        let length = text.chars().count();
        if let Some(min) = spec.min_length.filter(|min| length < *min) {
            messages.push(format!("must be at least {min} characters"));
        }
        if let Some(max) = spec.max_length.filter(|max| length > *max) {
            messages.push(format!("must be at most {max} characters"));
        }
        if !spec.one_of.is_empty() && !spec.one_of.contains(&text) {
            messages.push(format!("must be one of: {}", spec.one_of.join(", ")));
        }
        if let Some(pattern) = self.pattern.as_ref().filter(|pattern| !pattern.is_match(&text)) {
            messages.push(format!("does not match pattern {}", pattern.as_str()));
        }
        if messages.is_empty() {
            Ok(text)
        } else {
            Err(messages)
        }
    }

    fn check_bounds(&self, number: f64) -> Result<(), Vec<String>> {
        let mut messages = Vec::new();
        if let Some(min) = self.spec.min.filter(|min| number < *min) {
            messages.push(format!("must be at least {}", format_number(min)));
        }
        if let Some(max) = self.spec.max.filter(|max| number > *max) {
            messages.push(format!("must be at most {}", format_number(max)));
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages)
        }
    }
}

/// Null, blank text and empty lists count as "not provided".
fn is_absent(value: &CellValue) -> bool {
    match value {
        CellValue::Null => true,
        CellValue::Text(text) => text.trim().is_empty(),
        CellValue::List(items) => items.is_empty(),
        CellValue::Bool(_) | CellValue::Number(_) => false,
    }
}

fn coerce_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(number) => Some(*number),
        CellValue::Text(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

fn json_number(number: f64) -> Option<JsonValue> {
    Number::from_f64(number).map(JsonValue::Number)
}

fn coerce_bool(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(flag) => Some(*flag),
        CellValue::Number(number) if *number == 1.0 => Some(true),
        CellValue::Number(number) if *number == 0.0 => Some(false),
        CellValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Day zero of the 1900 date system, as used by spreadsheet serial dates.
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

fn coerce_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Number(serial) => from_serial(*serial),
        CellValue::Text(text) => {
            let text = text.trim();
            let date_part = text.split_once('T').map_or(text, |(date, _)| date);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
                .ok()
                .or_else(|| date_part.parse::<f64>().ok().and_then(from_serial))
        }
        _ => None,
    }
}

fn from_serial(serial: f64) -> Option<NaiveDate> {
    // 2958465 is 9999-12-31.
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    serial_epoch()?.checked_add_days(Days::new(serial.floor() as u64))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> MappedRecord {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn coerces_spreadsheet_values() {
        let schema = RowSchema::new(vec![
            FieldSpec::new("seats", FieldKind::Integer),
            FieldSpec::new("electric", FieldKind::Boolean),
            FieldSpec::new("registered", FieldKind::Date),
            FieldSpec::new("inspected", FieldKind::Date),
            FieldSpec::new("plate", FieldKind::Text),
        ])
        .unwrap();
        let object = schema
            .coerce(&row(&[
                ("seats", CellValue::from("5")),
                ("electric", CellValue::from("Yes")),
                ("registered", CellValue::Number(45292.0)),
                ("inspected", CellValue::from("02/03/2024")),
                ("plate", CellValue::Number(1234.0)),
                ("unknown", CellValue::from("stripped")),
            ]))
            .unwrap();
        assert_eq!(
            JsonValue::Object(object),
            json!({
                "seats": 5,
                "electric": true,
                "registered": "2024-01-01",
                "inspected": "2024-03-02",
                "plate": "1234",
            })
        );
    }

    #[test]
    fn blank_text_is_absent() {
        let schema = RowSchema::new(vec![
            FieldSpec::new("name", FieldKind::Text).required(),
            FieldSpec::new("notes", FieldKind::Text),
        ])
        .unwrap();
        let err = schema
            .coerce(&row(&[("name", CellValue::from("  ")), ("notes", CellValue::from(""))]))
            .unwrap_err();
        assert_eq!(err, vec![FieldViolation::new("name", "required")]);
    }

    #[test]
    fn collects_every_constraint_message() {
        let schema = RowSchema::new(vec![
            FieldSpec::new("age", FieldKind::Number).min(18.0).max(70.0),
            FieldSpec::new("code", FieldKind::Text)
                .length(Some(3), Some(3))
                .pattern("^[A-Z]+$"),
            FieldSpec::new("fuel", FieldKind::Text).one_of(["diesel", "electric"]),
        ])
        .unwrap();
        let err = schema
            .coerce(&row(&[
                ("age", CellValue::Number(12.5)),
                ("code", CellValue::from("ab")),
                ("fuel", CellValue::from("petrol")),
            ]))
            .unwrap_err();
        let rendered: Vec<String> = err.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "age: must be at least 18",
                "code: must be at least 3 characters",
                "code: does not match pattern ^[A-Z]+$",
                "fuel: must be one of: diesel, electric",
            ]
        );
    }

    #[test]
    fn type_mismatches_use_expected_messages() {
        let schema = RowSchema::new(vec![
            FieldSpec::new("age", FieldKind::Number),
            FieldSpec::new("seats", FieldKind::Integer),
            FieldSpec::new("active", FieldKind::Boolean),
            FieldSpec::new("since", FieldKind::Date),
        ])
        .unwrap();
        let err = schema
            .coerce(&row(&[
                ("age", CellValue::from("abc")),
                ("seats", CellValue::Number(2.5)),
                ("active", CellValue::from("maybe")),
                ("since", CellValue::from("31/02/2024")),
            ]))
            .unwrap_err();
        let rendered: Vec<String> = err.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "age: expected number",
                "seats: expected integer",
                "active: expected boolean",
                "since: expected date",
            ]
        );
    }

    #[test]
    fn deserialization_failure_is_a_record_violation() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Driver {
            name: String,
            licence: String,
        }
        let schema = RowSchema::new(vec![FieldSpec::new("name", FieldKind::Text)]).unwrap();
        let result: Result<Driver, _> = schema.validate(&row(&[("name", CellValue::from("Ada"))]));
        let violations = result.unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].path, "record");
        assert!(violations[0].message.contains("licence"));
    }

    #[test]
    fn rejects_bad_declarations() {
        assert!(matches!(
            RowSchema::new(vec![FieldSpec::new("code", FieldKind::Text).pattern("(")]),
            Err(SchemaError::InvalidPattern { .. })
        ));
        assert!(matches!(
            RowSchema::new(vec![
                FieldSpec::new("a", FieldKind::Text),
                FieldSpec::new("a", FieldKind::Number),
            ]),
            Err(SchemaError::DuplicateField(_))
        ));
        assert!(matches!(
            RowSchema::new(vec![FieldSpec::new("n", FieldKind::Number).min(5.0).max(1.0)]),
            Err(SchemaError::InvalidBounds { .. })
        ));
    }
}
