//! Per-row results of an import session.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::CellValue;

/// One parsed spreadsheet row: header name to untyped cell value.
pub type RawRecord = BTreeMap<String, CellValue>;

/// Validation result for a single imported row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRowOutcome<T> {
    /// 1-based line in the source sheet (the header is line 1).
    pub line: usize,
    pub original_row: RawRecord,
    pub mapped_data: Option<T>,
    pub errors: Vec<String>,
    pub is_valid: bool,
}

impl<T> ImportRowOutcome<T> {
    pub fn valid(line: usize, original_row: RawRecord, data: T) -> Self {
        Self {
            line,
            original_row,
            mapped_data: Some(data),
            errors: Vec::new(),
            is_valid: true,
        }
    }

    pub fn invalid(line: usize, original_row: RawRecord, errors: Vec<String>) -> Self {
        Self {
            line,
            original_row,
            mapped_data: None,
            errors,
            is_valid: false,
        }
    }

    /// Errors joined for single-line display.
    pub fn error_text(&self) -> String {
        self.errors.join("; ")
    }
}

/// What a host mutation callback reports back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SubmitResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Result of attempting to persist one validated row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitOutcome<T> {
    pub original_data: T,
    pub success: bool,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl<T> CommitOutcome<T> {
    pub fn from_response(original_data: T, response: SubmitResponse) -> Self {
        let error = if response.success {
            None
        } else {
            Some(
                response
                    .error
                    .clone()
                    .or_else(|| response.message.clone())
                    .unwrap_or_else(|| "submission failed".to_string()),
            )
        };
        Self {
            original_data,
            success: response.success,
            message: response.message,
            error,
        }
    }

    pub fn failed(original_data: T, error: impl Into<String>) -> Self {
        Self {
            original_data,
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}
