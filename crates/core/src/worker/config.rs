use crate::shared::constants::{DEFAULT_ENGINE, SUPPORTED_ENGINE};
use crate::worker::error::StartupError;

/// Values fixed at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Model name (e.g. `base`, `small.en`) or path to a ggml model file.
    pub model: String,
    pub engine: String,
    /// Force a language instead of auto-detecting it per request.
    pub language: Option<String>,
    pub threads: Option<usize>,
}

impl WorkerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            engine: DEFAULT_ENGINE.to_string(),
            language: None,
            threads: None,
        }
    }

    pub fn validate_engine(&self) -> Result<(), StartupError> {
        if self.engine != SUPPORTED_ENGINE {
            return Err(StartupError::UnsupportedEngine(self.engine.clone()));
        }
        Ok(())
    }
}
