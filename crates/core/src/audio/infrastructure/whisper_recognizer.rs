use std::path::Path;
use std::sync::Once;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::domain::transcript::{Transcript, TranscriptSegment};
use crate::shared::constants::MAX_WHISPER_THREADS;

static LOGGING_HOOKS: Once = Once::new();

/// Inference settings applied to every request.
#[derive(Clone, Debug, Default)]
pub struct WhisperOptions {
    /// Force this language code instead of auto-detecting it.
    pub language: Option<String>,
    pub threads: Option<usize>,
}

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model context is loaded once and stays resident; each request gets a
/// fresh inference state.
pub struct WhisperRecognizer {
    context: WhisperContext,
    language: Option<String>,
    threads: i32,
}

impl WhisperRecognizer {
    pub fn load(
        model_path: &Path,
        options: WhisperOptions,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        if !model_path.exists() {
            return Err(format!("Whisper model not found at: {}", model_path.display()).into());
        }
        LOGGING_HOOKS.call_once(whisper_rs::install_logging_hooks);

        let context = WhisperContext::new_with_params(
            model_path.to_str().ok_or("Invalid model path")?,
            WhisperContextParameters::default(),
        )
        .map_err(|e| format!("Failed to load Whisper model: {e}"))?;

        let threads = options
            .threads
            .filter(|n| *n > 0)
            .unwrap_or_else(|| num_cpus().min(MAX_WHISPER_THREADS));

        Ok(Self {
            context,
            language: options.language,
            threads: i32::try_from(threads).unwrap_or(i32::MAX),
        })
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn transcribe(&self, audio: &AudioSegment) -> Result<Transcript, Box<dyn std::error::Error>> {
        let mut state = self
            .context
            .create_state()
            .map_err(|e| format!("Failed to create Whisper state: {e}"))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(Some(self.language.as_deref().unwrap_or("auto")));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(self.threads);

        state
            .full(params, audio.samples())
            .map_err(|e| format!("Whisper inference failed: {e}"))?;

        let mut segments = Vec::new();
        for seg_idx in 0..state.full_n_segments() {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };
            // Segment boundaries can split a multi-byte character.
            let text = match segment.to_str_lossy() {
                Ok(t) => t.into_owned(),
                Err(e) => {
                    log::warn!("Skipping segment {seg_idx} without text: {e}");
                    continue;
                }
            };
            // Timestamps are in centiseconds (10ms units)
            segments.push(TranscriptSegment::new(
                text,
                segment.start_timestamp() as f64 / 100.0,
                segment.end_timestamp() as f64 / 100.0,
            ));
        }

        let language =
            whisper_rs::get_lang_str(state.full_lang_id_from_state()).map(str::to_string);

        Ok(Transcript::new(segments, language))
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_path_returns_error() {
        let result = WhisperRecognizer::load(
            Path::new("/nonexistent/ggml-base.bin"),
            WhisperOptions::default(),
        );
        let err = result.err().expect("load should fail").to_string();
        assert!(err.contains("not found"), "Expected 'not found' in error, got: {err}");
    }

    #[test]
    fn test_load_rejects_garbage_model_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a ggml model").unwrap();
        let result = WhisperRecognizer::load(file.path(), WhisperOptions::default());
        assert!(result.is_err());
    }

    #[test]
    #[ignore] // Requires a whisper model file at $WHISPER_TEST_MODEL
    fn test_transcribe_silence_does_not_crash() {
        let model = std::env::var("WHISPER_TEST_MODEL").expect("WHISPER_TEST_MODEL not set");
        let recognizer = WhisperRecognizer::load(Path::new(&model), WhisperOptions::default())
            .expect("Failed to load recognizer");
        let audio = AudioSegment::mono(vec![0.0; 16000 * 2], 16000);
        let result = recognizer.transcribe(&audio);
        assert!(result.is_ok(), "Transcription should not error: {result:?}");
    }
}
