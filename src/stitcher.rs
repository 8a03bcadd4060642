//! Concatenation of chunk audio into one padded buffer with global timestamps.

use std::time::Duration;

use crate::chunk::SynthesisChunk;
use crate::timestamps::{extract_word_timestamps, WordTimestamp};
use crate::SynthesisResult;

/// Silence added to both ends of the final audio so playback does not clip.
pub const DEFAULT_PADDING: Duration = Duration::from_millis(80);

/// Number of silent samples for `padding` at `sample_rate`.
pub fn padding_samples(padding: Duration, sample_rate: u32) -> usize {
    (padding.as_secs_f64() * sample_rate as f64).round() as usize
}

/// Accumulates chunks in emission order.
///
/// Each pushed chunk has its local timestamps shifted by the total duration of
/// all chunks before it. [`finish`](Self::finish) pads the audio and shifts
/// every timestamp by the leading silence.
#[derive(Debug)]
pub struct AudioStitcher {
    sample_rate: u32,
    padding: Duration,
    offset: f64,
    chunks: Vec<Vec<f32>>,
    timestamps: Vec<WordTimestamp>,
}

impl AudioStitcher {
    pub fn new(sample_rate: u32) -> Self {
        Self::with_padding(sample_rate, DEFAULT_PADDING)
    }

    pub fn with_padding(sample_rate: u32, padding: Duration) -> Self {
        Self {
            sample_rate,
            padding,
            offset: 0.0,
            chunks: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    /// Seconds of audio stitched so far, excluding padding.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn push(&mut self, chunk: SynthesisChunk) {
        let SynthesisChunk {
            audio,
            graphemes,
            alignment,
        } = chunk;

        let local = extract_word_timestamps(&alignment, &graphemes, audio.len(), self.sample_rate);
        log::debug!(
            "Chunk {}: {} samples, {} words at offset {:.4}s",
            self.chunks.len(),
            audio.len(),
            local.len(),
            self.offset
        );

        let offset = self.offset;
        self.timestamps.extend(local.into_iter().map(|mut stamp| {
            stamp.shift(offset);
            stamp
        }));

        self.offset += audio.len() as f64 / self.sample_rate as f64;
        self.chunks.push(audio);
    }

    /// Pad and concatenate. Zero pushed chunks yield an empty result.
    pub fn finish(self) -> SynthesisResult {
        if self.chunks.is_empty() {
            return SynthesisResult {
                samples: Vec::new(),
                timestamps: Vec::new(),
                sample_rate: self.sample_rate,
            };
        }

        let pad = padding_samples(self.padding, self.sample_rate);
        let total = self.chunks.iter().map(Vec::len).sum::<usize>() + 2 * pad;

        let mut samples = Vec::with_capacity(total);
        samples.resize(pad, 0.0);
        for chunk in &self.chunks {
            samples.extend_from_slice(chunk);
        }
        samples.resize(total, 0.0);

        let pad_secs = pad as f64 / self.sample_rate as f64;
        let mut timestamps = self.timestamps;
        for stamp in &mut timestamps {
            stamp.shift(pad_secs);
        }

        SynthesisResult {
            samples,
            timestamps,
            sample_rate: self.sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{ChunkAlignment, Token};

    const SR: u32 = 24_000;

    fn unaligned(samples: usize, text: &str) -> SynthesisChunk {
        SynthesisChunk::new(vec![0.5; samples], text, ChunkAlignment::Unaligned)
    }

    #[test]
    fn pad_is_80ms_at_24k() {
        assert_eq!(padding_samples(DEFAULT_PADDING, SR), 1920);
        assert_eq!(padding_samples(DEFAULT_PADDING, 22_050), 1764);
    }

    #[test]
    fn empty_stream_is_empty_result() {
        let result = AudioStitcher::new(SR).finish();
        assert!(result.samples.is_empty());
        assert!(result.timestamps.is_empty());
        assert_eq!(result.sample_rate, SR);
    }

    #[test]
    fn proportional_chunk_is_padded() {
        let mut stitcher = AudioStitcher::new(SR);
        stitcher.push(SynthesisChunk::new(
            vec![0.1; 24_000],
            "a bb ccc",
            ChunkAlignment::DurationEstimated(vec![10.0, 20.0, 30.0]),
        ));
        let result = stitcher.finish();

        assert_eq!(result.samples.len(), 24_000 + 2 * 1920);
        assert!(result.samples[..1920].iter().all(|&s| s == 0.0));
        assert!(result.samples[result.samples.len() - 1920..].iter().all(|&s| s == 0.0));
        assert_eq!(result.samples[1920], 0.1);
        assert_eq!(
            result.timestamps,
            vec![
                WordTimestamp::new("a", 0.08, 0.2467),
                WordTimestamp::new("bb", 0.2467, 0.58),
                WordTimestamp::new("ccc", 0.58, 1.08),
            ]
        );
    }

    #[test]
    fn second_chunk_is_offset_by_first() {
        let mut stitcher = AudioStitcher::new(SR);
        stitcher.push(unaligned(12_000, "one"));
        assert_eq!(stitcher.offset(), 0.5);
        stitcher.push(unaligned(12_000, "two"));
        assert_eq!(stitcher.offset(), 1.0);

        let result = stitcher.finish();
        assert_eq!(
            result.timestamps,
            vec![
                WordTimestamp::new("one", 0.08, 0.58),
                WordTimestamp::new("two", 0.58, 1.08),
            ]
        );
    }

    #[test]
    fn empty_audio_chunk_adds_no_offset() {
        let mut stitcher = AudioStitcher::new(SR);
        stitcher.push(unaligned(6_000, "first"));
        stitcher.push(unaligned(0, "silent"));
        stitcher.push(unaligned(6_000, "last"));
        assert_eq!(stitcher.chunk_count(), 3);
        assert_eq!(stitcher.offset(), 0.5);

        let result = stitcher.finish();
        assert_eq!(result.samples.len(), 12_000 + 3840);
        assert_eq!(result.timestamps[1], WordTimestamp::new("silent", 0.33, 0.33));
        assert_eq!(result.timestamps[2].start, 0.33);
    }

    #[test]
    fn token_chunks_keep_within_chunk_order() {
        let mut stitcher = AudioStitcher::with_padding(SR, Duration::ZERO);
        stitcher.push(SynthesisChunk::new(
            vec![0.0; 24_000],
            "Hi there.",
            ChunkAlignment::TokenAligned {
                tokens: vec![
                    Token::timed("Hi", 0.05, 0.3),
                    Token::timed("there", 0.35, 0.8),
                    Token::timed(".", 0.8, 0.9),
                ],
                duration_ticks: None,
            },
        ));
        stitcher.push(SynthesisChunk::new(
            vec![0.0; 24_000],
            "Bye.",
            ChunkAlignment::TokenAligned {
                tokens: vec![Token::timed("Bye", 0.1, 0.5), Token::timed(".", 0.5, 0.6)],
                duration_ticks: None,
            },
        ));

        let result = stitcher.finish();
        assert_eq!(result.samples.len(), 48_000);
        assert_eq!(
            result.timestamps,
            vec![
                WordTimestamp::new("Hi", 0.05, 0.3),
                WordTimestamp::new("there", 0.35, 0.9),
                WordTimestamp::new("Bye", 1.1, 1.6),
            ]
        );
    }
}
