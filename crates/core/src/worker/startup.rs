use crate::audio::domain::speech_recognizer::SpeechRecognizer;
use crate::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use crate::pipeline::transcribe_file_use_case::TranscribeFileUseCase;
use crate::worker::config::WorkerConfig;
use crate::worker::error::StartupError;

/// Validate the configuration and load the resident model.
///
/// Order matters: the engine selector is checked before anything touches
/// FFmpeg or the model, so a misconfigured worker fails fast.
pub fn load(config: &WorkerConfig) -> Result<TranscribeFileUseCase, StartupError> {
    config.validate_engine()?;
    let reader = FfmpegAudioReader::initialize().map_err(StartupError::DecoderUnavailable)?;
    let recognizer = load_recognizer(config)?;
    Ok(TranscribeFileUseCase::new(Box::new(reader), recognizer))
}

#[cfg(feature = "whisper")]
fn load_recognizer(config: &WorkerConfig) -> Result<Box<dyn SpeechRecognizer>, StartupError> {
    use crate::audio::infrastructure::whisper_recognizer::{WhisperOptions, WhisperRecognizer};
    use crate::shared::model_resolver;

    let model_path = model_resolver::resolve(&config.model, Some(download_progress()))
        .map_err(|source| StartupError::ModelResolve {
            model: config.model.clone(),
            source,
        })?;

    log::info!("Loading Whisper model from {}", model_path.display());
    let options = WhisperOptions {
        language: config.language.clone(),
        threads: config.threads,
    };
    let recognizer =
        WhisperRecognizer::load(&model_path, options).map_err(|e| StartupError::ModelLoad {
            model: config.model.clone(),
            detail: e.to_string(),
        })?;
    Ok(Box::new(recognizer))
}

#[cfg(not(feature = "whisper"))]
fn load_recognizer(_config: &WorkerConfig) -> Result<Box<dyn SpeechRecognizer>, StartupError> {
    Err(StartupError::InferenceUnavailable)
}

/// Log download progress in 10% steps; stderr may be forwarded line by line.
#[cfg(feature = "whisper")]
fn download_progress() -> crate::shared::model_resolver::ProgressFn {
    use std::sync::atomic::{AtomicU64, Ordering};

    let last_decile = AtomicU64::new(0);
    Box::new(move |downloaded, total| {
        if total == 0 {
            return;
        }
        let decile = downloaded.saturating_mul(10) / total;
        if decile > last_decile.swap(decile, Ordering::Relaxed) {
            log::info!("Downloading model... {}%", decile * 10);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_engine_fails_before_model_load() {
        let config = WorkerConfig {
            engine: "openai-whisper".into(),
            // Would fail resolution if it were ever reached.
            ..WorkerConfig::new("/nonexistent/ggml-base.bin")
        };
        let err = load(&config).err().expect("startup should fail");
        assert!(matches!(err, StartupError::UnsupportedEngine(_)), "got {err:?}");
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_missing_model_path_is_resolve_error() {
        let config = WorkerConfig::new("/nonexistent/ggml-base.bin");
        let err = load(&config).err().expect("startup should fail");
        assert!(matches!(err, StartupError::ModelResolve { .. }), "got {err:?}");
        assert!(err.to_string().contains("/nonexistent/ggml-base.bin"));
    }

    #[cfg(feature = "whisper")]
    #[test]
    fn test_corrupt_model_file_is_load_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a ggml model").unwrap();
        let config = WorkerConfig::new(file.path().to_str().unwrap());
        let err = load(&config).err().expect("startup should fail");
        assert!(matches!(err, StartupError::ModelLoad { .. }), "got {err:?}");
    }

    #[cfg(not(feature = "whisper"))]
    #[test]
    fn test_without_whisper_feature_reports_remediation() {
        let err = load(&WorkerConfig::new("base")).err().expect("startup should fail");
        assert!(matches!(err, StartupError::InferenceUnavailable));
    }
}
