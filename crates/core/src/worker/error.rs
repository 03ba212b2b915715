use std::error::Error as StdError;

use thiserror::Error;

use crate::shared::constants::EXIT_STARTUP_FAILURE;
use crate::shared::model_resolver::ModelResolveError;

/// Unrecoverable conditions before the worker accepts requests.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("Unsupported engine '{0}'. This worker supports only 'faster-whisper'.")]
    UnsupportedEngine(String),
    #[error(
        "Speech recognition is not available in this build. \
         Rebuild with: cargo build --release --features whisper"
    )]
    InferenceUnavailable,
    #[error(
        "Failed to initialize FFmpeg. Install the FFmpeg shared libraries \
         (libavformat, libavcodec, libswresample). FFmpeg error: {0}"
    )]
    DecoderUnavailable(#[source] ffmpeg_next::Error),
    #[error("Failed to resolve Whisper model '{model}': {source}")]
    ModelResolve {
        model: String,
        #[source]
        source: ModelResolveError,
    },
    #[error("Failed to load Whisper model '{model}': {detail}")]
    ModelLoad { model: String, detail: String },
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        EXIT_STARTUP_FAILURE
    }
}

/// Failures scoped to a single request; the loop reports them and continues.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request line is not valid UTF-8: {0}")]
    InvalidEncoding(#[source] std::str::Utf8Error),
    #[error("invalid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("request must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    #[error("Unsupported op: {0}")]
    UnsupportedOp(String),
    #[error("Missing or invalid audioPath")]
    InvalidAudioPath,
    #[error("transcription failed: {0}")]
    Transcription(#[source] Box<dyn StdError>),
    #[error("panicked while handling request: {0}")]
    Panicked(String),
}

impl RequestError {
    /// Diagnostic trace for the response. Parameter errors carry none.
    pub fn stack(&self) -> Option<String> {
        match self {
            Self::UnsupportedOp(_) | Self::InvalidAudioPath => None,
            _ => Some(error_chain(self)),
        }
    }
}

/// Render an error and its sources, outermost first.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = format!("Error: {err}");
    let mut source = err.source();
    let mut depth = 0;
    while let Some(cause) = source {
        if depth == 0 {
            out.push_str("\n\nCaused by:");
        }
        out.push_str(&format!("\n    {depth}: {cause}"));
        depth += 1;
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Error, Debug)]
    #[error("outer failure")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_lists_causes() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::NotFound, "disk gone"));
        let chain = error_chain(&err);
        assert!(chain.starts_with("Error: outer failure"));
        assert!(chain.contains("0: disk gone"));
    }

    #[test]
    fn test_error_chain_without_source() {
        assert_eq!(
            error_chain(&RequestError::InvalidAudioPath),
            "Error: Missing or invalid audioPath"
        );
    }

    #[test]
    fn test_parameter_errors_have_no_stack() {
        assert!(RequestError::InvalidAudioPath.stack().is_none());
        assert!(RequestError::UnsupportedOp("translate".into()).stack().is_none());
    }

    #[test]
    fn test_transcription_error_stack_includes_cause() {
        let err = RequestError::Transcription("decoder exploded".into());
        assert_eq!(err.to_string(), "transcription failed: decoder exploded");
        assert!(err.stack().unwrap().contains("0: decoder exploded"));
    }

    #[test]
    fn test_unsupported_engine_message_names_engine() {
        let err = StartupError::UnsupportedEngine("openai-whisper".into());
        assert!(err.to_string().contains("'openai-whisper'"));
        assert!(err.to_string().contains("faster-whisper"));
        assert_eq!(err.exit_code(), EXIT_STARTUP_FAILURE);
    }

    #[test]
    fn test_inference_unavailable_tells_how_to_fix() {
        let msg = StartupError::InferenceUnavailable.to_string();
        assert!(msg.contains("--features whisper"));
    }
}
