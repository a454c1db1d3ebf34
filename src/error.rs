use serde_json::Value;
use thiserror::Error;

use crate::types::json_type;

#[derive(Debug, Error)]
pub enum IncidentError {
    #[error("{0}")]
    Parse(String),

    #[error("Missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    #[error("Field '{field}' must be {expected}, got {found}")]
    InvalidField {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{0:#}")]
    Storage(anyhow::Error),
}

impl IncidentError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_field(field: &str, expected: &'static str, found: &Value) -> Self {
        Self::InvalidField {
            field: field.to_owned(),
            expected,
            found: json_type(found),
        }
    }
}

impl From<serde_json::Error> for IncidentError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(format!("Invalid JSON body: {err}"))
    }
}
