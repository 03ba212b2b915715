//! Response side of the JSON Lines protocol. Every response is one JSON
//! object on one line, flushed as soon as it is written.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use crate::pipeline::transcribe_file_use_case::TranscriptionResult;
use crate::shared::constants::{FATAL_ID, READY_EVENT, READY_ID};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ready {
        id: Value,
        ok: bool,
        event: &'static str,
        engine: String,
        model: String,
    },
    Success {
        id: Value,
        ok: bool,
        result: TranscriptionResult,
    },
    Error {
        id: Value,
        ok: bool,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl Response {
    pub fn ready(engine: impl Into<String>, model: impl Into<String>) -> Self {
        Self::Ready {
            id: Value::from(READY_ID),
            ok: true,
            event: READY_EVENT,
            engine: engine.into(),
            model: model.into(),
        }
    }

    pub fn success(id: Value, result: TranscriptionResult) -> Self {
        Self::Success {
            id,
            ok: true,
            result,
        }
    }

    pub fn error(id: Value, error: impl Into<String>, stack: Option<String>) -> Self {
        Self::Error {
            id,
            ok: false,
            error: error.into(),
            stack,
        }
    }

    /// The single line emitted before exiting on a startup failure.
    pub fn fatal(error: impl Into<String>) -> Self {
        Self::error(Value::from(FATAL_ID), error, None)
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Self::Ready { ok, .. } | Self::Success { ok, .. } | Self::Error { ok, .. } => *ok,
        }
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Write the response as one line and flush. The line is serialized in
    /// full before anything is written.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut line = self.to_line()?;
        line.push('\n');
        writer.write_all(line.as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_json(response: &Response) -> Value {
        serde_json::from_str(&response.to_line().unwrap()).unwrap()
    }

    #[test]
    fn test_ready_shape() {
        let r = Response::ready("faster-whisper", "base");
        assert_eq!(
            as_json(&r),
            json!({
                "id": 0,
                "ok": true,
                "event": "READY",
                "engine": "faster-whisper",
                "model": "base"
            })
        );
    }

    #[test]
    fn test_success_shape_keeps_null_language() {
        let r = Response::success(
            json!(5),
            TranscriptionResult {
                text: "hello world".into(),
                language: None,
            },
        );
        assert_eq!(
            as_json(&r),
            json!({"id": 5, "ok": true, "result": {"text": "hello world", "language": null}})
        );
    }

    #[test]
    fn test_error_without_stack_omits_field() {
        let r = Response::error(json!("a"), "Missing or invalid audioPath", None);
        let line = r.to_line().unwrap();
        assert!(!line.contains("stack"));
        assert_eq!(
            as_json(&r),
            json!({"id": "a", "ok": false, "error": "Missing or invalid audioPath"})
        );
    }

    #[test]
    fn test_fatal_shape() {
        let r = Response::fatal("boom");
        assert!(!r.is_ok());
        assert_eq!(as_json(&r), json!({"id": -1, "ok": false, "error": "boom"}));
    }

    #[test]
    fn test_multiline_content_stays_on_one_line() {
        let r = Response::error(Value::Null, "first\nsecond", Some("a\nb\r\nc".into()));
        let mut out = Vec::new();
        r.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('\n').count(), 1);
        assert!(text.ends_with('\n'));
        assert_eq!(as_json(&r)["stack"], json!("a\nb\r\nc"));
    }

    #[test]
    fn test_non_ascii_text_is_written_unescaped() {
        let r = Response::success(
            json!(1),
            TranscriptionResult {
                text: "grüß dich".into(),
                language: Some("de".into()),
            },
        );
        assert!(r.to_line().unwrap().contains("grüß dich"));
    }
}
