/// Decoded mono audio ready for inference: PCM samples normalized to [-1.0, 1.0].
#[derive(Clone, Debug, Default)]
pub struct AudioSegment {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioSegment {
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds; zero when no sample rate is known.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mono_keeps_samples_and_rate() {
        let samples = vec![0.25f32; 320];
        let seg = AudioSegment::mono(samples.clone(), 16000);
        assert_eq!(seg.samples(), &samples[..]);
        assert_eq!(seg.sample_rate(), 16000);
    }

    #[test]
    fn test_duration_secs() {
        let seg = AudioSegment::mono(vec![0.0; 48000], 16000);
        assert_eq!(seg.duration_secs(), 3.0);
    }

    #[test]
    fn test_duration_without_rate_is_zero() {
        assert_eq!(AudioSegment::default().duration_secs(), 0.0);
    }

    #[test]
    fn test_is_empty() {
        assert!(AudioSegment::mono(Vec::new(), 16000).is_empty());
        assert!(!AudioSegment::mono(vec![0.1], 16000).is_empty());
    }
}
