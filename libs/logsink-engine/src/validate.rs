use serde_json::Value;

use logsink_api::{Document, Record};

use crate::error::IngestError;

/// Turn a decoded document into a `Record`.
///
/// Types are checked strictly: `service` must be a non-empty string,
/// `path` a string, and `data` an object or `null`. Client-supplied
/// timestamps are ignored.
pub fn validate(document: Option<Document>) -> Result<Record, IngestError> {
    let mut document = document.ok_or(IngestError::MissingField("document"))?;

    let service = document.remove("service").ok_or(IngestError::MissingField("service"))?;
    let path = document.remove("path").ok_or(IngestError::MissingField("path"))?;

    let service = match service {
        Value::String(s) if !s.is_empty() => s,
        Value::String(_) => {
            return Err(IngestError::InvalidField {
                field: "service",
                reason: "must not be empty".into(),
            });
        }
        other => return Err(type_error("service", "a string", &other)),
    };

    let path = match path {
        Value::String(s) => s,
        other => return Err(type_error("path", "a string", &other)),
    };

    let data = match document.remove("data") {
        None | Some(Value::Null) => Document::new(),
        Some(Value::Object(map)) => map,
        Some(other) => return Err(type_error("data", "an object", &other)),
    };

    Ok(Record::new(service, path, data))
}

fn type_error(field: &'static str, expected: &str, got: &Value) -> IngestError {
    IngestError::InvalidField {
        field,
        reason: format!("expected {expected}, got {}", type_name(got)),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
