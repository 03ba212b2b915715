use std::io;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use transcribe_worker_core::protocol::response::Response;
use transcribe_worker_core::shared::constants::{DEFAULT_ENGINE, EXIT_IO_FAILURE, EXIT_OK};
use transcribe_worker_core::worker::config::WorkerConfig;
use transcribe_worker_core::worker::error::StartupError;
use transcribe_worker_core::worker::panic_trace;
use transcribe_worker_core::worker::startup;
use transcribe_worker_core::worker::worker_loop::Worker;

/// Resident speech-to-text worker.
///
/// Loads a Whisper model once, then answers JSON Lines requests on stdin
/// (`{"id": 1, "op": "transcribe", "audioPath": "/tmp/a.wav"}`) with one
/// JSON line each on stdout. Logs go to stderr.
#[derive(Parser)]
#[command(name = "transcribe-worker", version)]
struct Cli {
    /// Whisper model name (e.g. base, small.en, large-v3) or path to a ggml model file.
    #[arg(long)]
    model: String,

    /// Engine selector. Only faster-whisper is supported.
    #[arg(long, default_value = DEFAULT_ENGINE)]
    engine: String,

    /// Force a language code (e.g. en, de) instead of auto-detecting it.
    #[arg(long)]
    language: Option<String>,

    /// Inference threads (default: available cores, at most 4).
    #[arg(long)]
    threads: Option<usize>,
}

impl From<Cli> for WorkerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            model: cli.model,
            engine: cli.engine,
            language: cli.language,
            threads: cli.threads,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
    panic_trace::install();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => fatal(&StartupError::InvalidArguments(e.to_string())),
    };

    process::exit(run(cli.into()));
}

fn run(config: WorkerConfig) -> i32 {
    log::info!(
        "Starting worker (engine={}, model={})",
        config.engine,
        config.model
    );
    let transcriber = match startup::load(&config) {
        Ok(t) => t,
        Err(e) => fatal(&e),
    };

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    if let Err(e) = Response::ready(&config.engine, &config.model).write_to(&mut stdout) {
        log::error!("Failed to write ready event: {e}");
        return EXIT_IO_FAILURE;
    }
    log::info!("Worker ready");

    let stdin = io::stdin();
    match Worker::new(&transcriber).run(stdin.lock(), &mut stdout) {
        Ok(_) => EXIT_OK,
        Err(e) => {
            log::error!("Protocol stream failed: {e}");
            EXIT_IO_FAILURE
        }
    }
}

/// Report a startup failure on the protocol stream and exit.
fn fatal(error: &StartupError) -> ! {
    log::error!("{error}");
    let mut stdout = io::stdout().lock();
    if let Err(e) = Response::fatal(error.to_string()).write_to(&mut stdout) {
        log::error!("Failed to write startup error: {e}");
    }
    process::exit(error.exit_code());
}
