//! Resident speech-to-text worker.
//!
//! Loads one Whisper model at startup and answers `transcribe` requests
//! read as JSON lines from stdin, one response line per request on stdout.

pub mod audio {
    pub mod domain {
        pub mod audio_reader;
        pub mod audio_segment;
        pub mod speech_recognizer;
        pub mod transcript;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod transcribe_file_use_case;
}

pub mod protocol {
    pub mod request;
    pub mod response;
}

pub mod shared {
    pub mod constants;
    pub mod model_resolver;
}

pub mod worker {
    pub mod config;
    pub mod error;
    pub mod panic_trace;
    pub mod startup;
    pub mod worker_loop;
}
