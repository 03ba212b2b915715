use super::audio_segment::AudioSegment;
use super::transcript::Transcript;

/// Domain interface for speech-to-text transcription.
///
/// Implementations hold a loaded model and run inference on 16 kHz mono audio,
/// producing ordered text segments and, when the engine reports one, the
/// detected language.
pub trait SpeechRecognizer: Send {
    fn transcribe(&self, audio: &AudioSegment) -> Result<Transcript, Box<dyn std::error::Error>>;
}
