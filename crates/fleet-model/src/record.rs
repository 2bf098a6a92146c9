use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::{CellValue, ModelError, RecordId};

/// An entity shown as one table row.
///
/// The engines only ever read fields through this trait: `value` for a
/// single addressed field, `values` for the whole record (search).
pub trait Record {
    fn id(&self) -> &str;

    /// Value of field `key`, or `CellValue::Null` when the record has no such field.
    fn value(&self, key: &str) -> CellValue;

    /// Every field value of the record, the id included.
    fn values(&self) -> Vec<CellValue>;
}

/// Duck-typed record: an id plus arbitrary named fields.
///
/// Converting from JSON enforces the `id` field at the boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "JsonValue", into = "JsonValue")]
pub struct DataRecord {
    pub id: RecordId,
    pub fields: BTreeMap<String, CellValue>,
}

impl DataRecord {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build a record from a JSON object, taking `id` from the object itself.
    pub fn from_json_object(map: serde_json::Map<String, JsonValue>) -> Result<Self, ModelError> {
        let mut fields = BTreeMap::new();
        let mut id = None;
        for (key, value) in map {
            if key == "id" {
                id = match value {
                    JsonValue::String(text) => Some(RecordId::new(text)?),
                    JsonValue::Number(number) => Some(RecordId::new(number.to_string())?),
                    _ => return Err(ModelError::MissingRecordId),
                };
            } else {
                fields.insert(key, CellValue::from(value));
            }
        }
        let id = id.ok_or(ModelError::MissingRecordId)?;
        Ok(Self { id, fields })
    }
}

impl Record for DataRecord {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn value(&self, key: &str) -> CellValue {
        if key == "id" {
            return CellValue::Text(self.id.to_string());
        }
        self.fields.get(key).cloned().unwrap_or_default()
    }

    fn values(&self) -> Vec<CellValue> {
        std::iter::once(CellValue::Text(self.id.to_string()))
            .chain(self.fields.values().cloned())
            .collect()
    }
}

impl TryFrom<JsonValue> for DataRecord {
    type Error = ModelError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(map) => Self::from_json_object(map),
            JsonValue::Array(_) => Err(ModelError::NotAnObject("array")),
            JsonValue::String(_) => Err(ModelError::NotAnObject("string")),
            JsonValue::Number(_) => Err(ModelError::NotAnObject("number")),
            JsonValue::Bool(_) => Err(ModelError::NotAnObject("boolean")),
            JsonValue::Null => Err(ModelError::NotAnObject("null")),
        }
    }
}

impl From<DataRecord> for JsonValue {
    fn from(record: DataRecord) -> Self {
        let mut map = serde_json::Map::new();
        map.insert("id".to_string(), JsonValue::String(record.id.into()));
        for (key, value) in record.fields {
            map.insert(key, value.into());
        }
        JsonValue::Object(map)
    }
}
