//! Request side of the JSON Lines protocol.
//!
//! ```text
//! {"id": 1, "op": "transcribe", "audioPath": "/tmp/clip.wav"}
//! ```

use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::worker::error::RequestError;

/// Operations the worker understands, keyed on the `op` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Transcribe { audio_path: PathBuf },
}

/// A fully decoded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Opaque caller identifier, echoed verbatim. Null when absent.
    pub id: Value,
    pub operation: Operation,
}

/// A request that could not be decoded, with whatever id could be recovered.
#[derive(Debug)]
pub struct RejectedRequest {
    pub id: Value,
    pub error: RequestError,
}

impl RejectedRequest {
    fn new(id: Value, error: RequestError) -> Self {
        Self { id, error }
    }
}

impl Request {
    pub fn parse(line: &str) -> Result<Self, RejectedRequest> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| RejectedRequest::new(Value::Null, RequestError::Malformed(e)))?;
        let object = match value {
            Value::Object(map) => map,
            other => {
                return Err(RejectedRequest::new(
                    Value::Null,
                    RequestError::NotAnObject(json_kind(&other)),
                ))
            }
        };

        let id = object.get("id").cloned().unwrap_or(Value::Null);
        match Self::parse_operation(&object) {
            Ok(operation) => Ok(Self { id, operation }),
            Err(error) => Err(RejectedRequest::new(id, error)),
        }
    }

    fn parse_operation(object: &Map<String, Value>) -> Result<Operation, RequestError> {
        match object.get("op") {
            Some(Value::String(op)) if op == "transcribe" => {}
            Some(Value::String(op)) => return Err(RequestError::UnsupportedOp(op.clone())),
            Some(other) => return Err(RequestError::UnsupportedOp(other.to_string())),
            None => return Err(RequestError::UnsupportedOp("null".to_string())),
        }

        match object.get("audioPath") {
            Some(Value::String(path)) if !path.is_empty() => Ok(Operation::Transcribe {
                audio_path: PathBuf::from(path),
            }),
            _ => Err(RequestError::InvalidAudioPath),
        }
    }
}

/// Best-effort id recovery for lines whose handling failed unexpectedly.
pub fn peek_id(line: &str) -> Value {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(mut map)) => map.remove("id").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
