//! Units emitted by a synthesis engine.

/// A word or punctuation span produced by the engine, with optional timing
/// relative to the start of its chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Start time in seconds.
    pub start: Option<f64>,
    /// End time in seconds.
    pub end: Option<f64>,
}

impl Token {
    /// A token with complete timing.
    pub fn timed(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// A token the engine could not place in time.
    pub fn untimed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start: None,
            end: None,
        }
    }
}

/// How much alignment metadata the engine attached to a chunk.
///
/// Chosen by the producer; the timestamp extractor dispatches on the tag
/// instead of probing for optional fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ChunkAlignment {
    /// Word-level tokens. `duration_ticks` is kept for the case where none of
    /// the tokens carry usable timing.
    TokenAligned {
        tokens: Vec<Token>,
        duration_ticks: Option<Vec<f32>>,
    },
    /// Phoneme-level relative durations only.
    DurationEstimated(Vec<f32>),
    /// No alignment metadata at all.
    #[default]
    Unaligned,
}

impl ChunkAlignment {
    pub fn tokens(&self) -> &[Token] {
        match self {
            Self::TokenAligned { tokens, .. } => tokens,
            _ => &[],
        }
    }

    pub fn duration_ticks(&self) -> Option<&[f32]> {
        match self {
            Self::TokenAligned { duration_ticks, .. } => duration_ticks.as_deref(),
            Self::DurationEstimated(ticks) => Some(ticks),
            Self::Unaligned => None,
        }
    }
}

/// One unit of engine output: mono audio for a portion of the input text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SynthesisChunk {
    /// Raw audio samples at the engine's fixed sample rate.
    pub audio: Vec<f32>,
    /// The plain text this chunk speaks.
    pub graphemes: String,
    pub alignment: ChunkAlignment,
}

impl SynthesisChunk {
    pub fn new(audio: Vec<f32>, graphemes: impl Into<String>, alignment: ChunkAlignment) -> Self {
        Self {
            audio,
            graphemes: graphemes.into(),
            alignment,
        }
    }

    /// Duration of the chunk audio in seconds.
    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.audio.len() as f64 / sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_aligned_exposes_fallback_ticks() {
        let alignment = ChunkAlignment::TokenAligned {
            tokens: vec![Token::untimed("hi")],
            duration_ticks: Some(vec![1.0, 2.0]),
        };
        assert_eq!(alignment.tokens().len(), 1);
        assert_eq!(alignment.duration_ticks(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn unaligned_has_no_metadata() {
        let alignment = ChunkAlignment::default();
        assert!(alignment.tokens().is_empty());
        assert!(alignment.duration_ticks().is_none());
    }

    #[test]
    fn chunk_duration_uses_sample_rate() {
        let chunk = SynthesisChunk::new(vec![0.0; 12_000], "hi", ChunkAlignment::Unaligned);
        assert_eq!(chunk.duration_secs(24_000), 0.5);
    }
}
