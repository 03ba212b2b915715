pub mod ffmpeg_audio_reader;
#[cfg(feature = "whisper")]
pub mod whisper_recognizer;
