use std::path::Path;
use std::time::Instant;

use serde::Serialize;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::Transcript;
use crate::shared::constants::WHISPER_SAMPLE_RATE;

/// Final text and detected language for one audio file.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TranscriptionResult {
    pub text: String,
    pub language: Option<String>,
}

impl From<Transcript> for TranscriptionResult {
    fn from(transcript: Transcript) -> Self {
        Self {
            text: transcript.text(),
            language: transcript.language,
        }
    }
}

/// Decodes an audio file and runs the resident recognizer over it.
pub struct TranscribeFileUseCase {
    reader: Box<dyn AudioReader>,
    recognizer: Box<dyn SpeechRecognizer>,
}

impl TranscribeFileUseCase {
    pub fn new(reader: Box<dyn AudioReader>, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self { reader, recognizer }
    }

    pub fn execute(
        &self,
        audio_path: &Path,
    ) -> Result<TranscriptionResult, Box<dyn std::error::Error>> {
        if !audio_path.is_file() {
            return Err(format!("audio file not found: {}", audio_path.display()).into());
        }

        let audio = self
            .reader
            .read_audio(audio_path, WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| format!("no audio stream in {}", audio_path.display()))?;

        // Nothing to recognize; whisper.cpp rejects zero-length input.
        if audio.is_empty() {
            return Ok(Transcript::default().into());
        }

        let started = Instant::now();
        let transcript = self.recognizer.transcribe(&audio)?;
        log::debug!(
            "Recognized {:.2}s of audio in {:.2}s ({} segments, {:.2}s of speech)",
            audio.duration_secs(),
            started.elapsed().as_secs_f64(),
            transcript.segments.len(),
            transcript.speech_secs()
        );

        Ok(transcript.into())
    }
}
