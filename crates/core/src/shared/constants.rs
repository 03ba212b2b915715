/// The only engine selector accepted on the command line. Kept under this
/// name so existing parent processes can spawn the worker unchanged.
pub const SUPPORTED_ENGINE: &str = "faster-whisper";
pub const DEFAULT_ENGINE: &str = SUPPORTED_ENGINE;

pub const WHISPER_SAMPLE_RATE: u32 = 16000;
pub const WHISPER_MODEL_BASE_URL: &str =
    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";
pub const MAX_WHISPER_THREADS: usize = 4;

/// Directory name under the user cache dir holding downloaded models.
pub const MODEL_CACHE_DIR_NAME: &str = "transcribe-worker";

pub const READY_EVENT: &str = "READY";
pub const READY_ID: i64 = 0;
pub const FATAL_ID: i64 = -1;

pub const EXIT_OK: i32 = 0;
pub const EXIT_IO_FAILURE: i32 = 1;
pub const EXIT_STARTUP_FAILURE: i32 = 2;
