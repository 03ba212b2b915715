/// One contiguous piece of recognized speech, as reported by the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_time: f64, end_time: f64) -> Self {
        Self {
            text: text.into(),
            start_time,
            end_time,
        }
    }
}

/// Ordered recognizer output for one audio file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    pub segments: Vec<TranscriptSegment>,
    /// Language code detected by the engine, if it reports one.
    pub language: Option<String>,
}

impl Transcript {
    pub fn new(segments: Vec<TranscriptSegment>, language: Option<String>) -> Self {
        Self { segments, language }
    }

    /// Trimmed, non-empty segment texts joined with single spaces.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    /// Seconds covered by segments that carry text.
    pub fn speech_secs(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| !s.text.trim().is_empty())
            .map(|s| (s.end_time - s.start_time).max(0.0))
            .sum()
    }
}
