use std::path::Path;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;

/// Decodes any FFmpeg-readable audio file to mono f32 using ffmpeg-next.
#[derive(Debug)]
pub struct FfmpegAudioReader {
    _initialized: (),
}

impl FfmpegAudioReader {
    /// Initialize the FFmpeg libraries. Fails when they cannot be loaded,
    /// which leaves the worker unable to decode any request.
    pub fn initialize() -> Result<Self, ffmpeg_next::Error> {
        ffmpeg_next::init()?;
        ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
        Ok(Self { _initialized: () })
    }
}

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        let mut ictx = ffmpeg_next::format::input(path)
            .map_err(|e| format!("Failed to open audio file {}: {e}", path.display()))?;

        let audio_stream = match ictx.streams().best(ffmpeg_next::media::Type::Audio) {
            Some(stream) => stream,
            None => return Ok(None),
        };
        let audio_stream_index = audio_stream.index();

        let codec_ctx =
            ffmpeg_next::codec::context::Context::from_parameters(audio_stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        // WAV files often carry no explicit channel layout.
        if decoder.channel_layout().is_empty() {
            decoder.set_channel_layout(ffmpeg_next::ChannelLayout::default(
                i32::from(decoder.channels()),
            ));
        }

        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Planar),
            ffmpeg_next::ChannelLayout::MONO,
            target_sample_rate,
        )?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != audio_stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled)?;
                append_mono_samples(&resampled, &mut samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            append_mono_samples(&resampled, &mut samples);
        }

        // The resampler may still hold buffered output.
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                append_mono_samples(&resampled, &mut samples);
            }
        }

        log::debug!(
            "Decoded {} samples at {target_sample_rate} Hz from {}",
            samples.len(),
            path.display()
        );
        Ok(Some(AudioSegment::mono(samples, target_sample_rate)))
    }
}

/// Append the f32 samples of a planar mono frame.
fn append_mono_samples(frame: &ffmpeg_next::util::frame::audio::Audio, out: &mut Vec<f32>) {
    let count = frame.samples();
    if count == 0 {
        return;
    }
    out.extend_from_slice(&frame.plane::<f32>(0)[..count]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_audio_nonexistent_file() {
        let reader = FfmpegAudioReader::initialize().unwrap();
        let path = if cfg!(windows) {
            Path::new("Z:\\nonexistent\\speech.wav")
        } else {
            Path::new("/nonexistent/speech.wav")
        };
        let err = reader.read_audio(path, 16000).unwrap_err().to_string();
        assert!(err.contains("Failed to open audio file"), "got: {err}");
    }

    #[test]
    fn test_read_audio_rejects_non_media_file() {
        let reader = FfmpegAudioReader::initialize().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not audio").unwrap();
        assert!(reader.read_audio(file.path(), 16000).is_err());
    }

    #[test]
    fn test_reads_pcm16_wav_as_mono() {
        let reader = FfmpegAudioReader::initialize().unwrap();
        let file = write_wav(&[0i16; 1600], 16000, 2);
        let audio = reader
            .read_audio(file.path(), 16000)
            .unwrap()
            .expect("wav has an audio stream");
        assert_eq!(audio.sample_rate(), 16000);
        // 1600 interleaved stereo samples -> 800 mono frames, give or take resampler padding.
        let n = audio.samples().len();
        assert!((700..=900).contains(&n), "unexpected sample count {n}");
    }

    fn write_wav(samples: &[i16], rate: u32, channels: u16) -> tempfile::NamedTempFile {
        let data_len = (samples.len() * 2) as u32;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&rate.to_le_bytes());
        bytes.extend_from_slice(&(rate * u32::from(channels) * 2).to_le_bytes());
        bytes.extend_from_slice(&(channels * 2).to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for s in samples {
            bytes.extend_from_slice(&s.to_le_bytes());
        }
        let mut file = tempfile::Builder::new().suffix(".wav").tempfile().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }
}
