//! The request/response loop.
//!
//! Lines are read and answered strictly one at a time: the next line is not
//! read until the response to the current one has been written and flushed.

use std::io::{self, BufRead, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use serde_json::Value;

use crate::pipeline::transcribe_file_use_case::TranscribeFileUseCase;
use crate::protocol::request::{self, Operation, Request};
use crate::protocol::response::Response;
use crate::worker::error::RequestError;
use crate::worker::panic_trace;

/// Counters reported when the input stream closes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub requests: usize,
    pub failures: usize,
}

pub struct Worker<'a> {
    transcriber: &'a TranscribeFileUseCase,
}

impl<'a> Worker<'a> {
    pub fn new(transcriber: &'a TranscribeFileUseCase) -> Self {
        Self { transcriber }
    }

    /// Serve requests from `input` until end of stream.
    ///
    /// Only I/O failures on the streams themselves end the loop early;
    /// every request-level failure becomes an error response. Panic
    /// responses carry a backtrace only once [`panic_trace::install`] has
    /// run; otherwise `stack` holds just the panic message.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, output: &mut W) -> io::Result<LoopStats> {
        let mut stats = LoopStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            let Some(response) = self.handle_line(&line) else {
                continue;
            };
            stats.requests += 1;
            if !response.is_ok() {
                stats.failures += 1;
            }
            response.write_to(output)?;
        }

        log::info!(
            "Input closed after {} requests ({} failed)",
            stats.requests,
            stats.failures
        );
        Ok(stats)
    }

    /// Produce the response for one raw input line, or `None` for a blank line.
    pub fn handle_line(&self, raw: &[u8]) -> Option<Response> {
        let text = match std::str::from_utf8(raw) {
            Ok(text) => text.trim(),
            Err(e) => return Some(error_response(Value::Null, RequestError::InvalidEncoding(e))),
        };
        if text.is_empty() {
            return None;
        }

        match panic::catch_unwind(AssertUnwindSafe(|| self.respond(text))) {
            Ok(response) => Some(response),
            Err(payload) => {
                let message = panic_trace::payload_message(payload.as_ref());
                let error = RequestError::Panicked(message);
                let stack = panic_trace::take().or_else(|| error.stack());
                Some(Response::error(request::peek_id(text), error.to_string(), stack))
            }
        }
    }

    fn respond(&self, text: &str) -> Response {
        let request = match Request::parse(text) {
            Ok(request) => request,
            Err(rejected) => {
                log::warn!("Rejected request (id={}): {}", rejected.id, rejected.error);
                return error_response(rejected.id, rejected.error);
            }
        };

        match &request.operation {
            Operation::Transcribe { audio_path } => self.transcribe(request.id, audio_path),
        }
    }

    fn transcribe(&self, id: Value, audio_path: &Path) -> Response {
        log::debug!("Transcribing {} (id={id})", audio_path.display());
        let started = Instant::now();

        match self.transcriber.execute(audio_path) {
            Ok(result) => {
                log::info!(
                    "Transcription completed (id={id}, chars={}, language={}, {}ms)",
                    result.text.len(),
                    result.language.as_deref().unwrap_or("unknown"),
                    started.elapsed().as_millis()
                );
                Response::success(id, result)
            }
            Err(e) => {
                let error = RequestError::Transcription(e);
                log::error!("Transcription failed (id={id}): {error}");
                error_response(id, error)
            }
        }
    }
}

fn error_response(id: Value, error: RequestError) -> Response {
    let stack = error.stack();
    Response::error(id, error.to_string(), stack)
}
