//! Word-level timestamp extraction for a single chunk.
//!
//! Three strategies, tried in order:
//!
//! 1. **Token-based**: engine tokens with start/end times. Punctuation-only
//!    tokens do not produce entries; their end time extends the previous word.
//! 2. **Duration-proportional**: when duration ticks are present, the chunk
//!    duration is split across whitespace-separated words in proportion to
//!    their character length. Ticks are phoneme-level, so this is only an
//!    approximation of the real word boundaries.
//! 3. **Uniform**: the chunk duration is divided evenly across words.
//!
//! All returned times are relative to the start of the chunk and rounded to
//! 0.1 ms.

use serde::{Deserialize, Serialize};

use crate::chunk::{ChunkAlignment, Token};

/// A word and the span of audio in which it is spoken, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

impl WordTimestamp {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            start: round_secs(start),
            end: round_secs(end),
        }
    }

    /// Move the span later by `secs`, keeping 4-decimal precision.
    pub fn shift(&mut self, secs: f64) {
        self.start = round_secs(self.start + secs);
        self.end = round_secs(self.end + secs);
    }
}

/// Round a time in seconds to 4 decimal places.
///
/// Rounds the exact binary value. Scaling by 10^4 first would turn values
/// just below a half (54 samples at 24 kHz is 0.002249999...) into exact
/// halves that then round up.
pub fn round_secs(secs: f64) -> f64 {
    format!("{secs:.4}").parse().unwrap_or(secs)
}

/// Produce chunk-local word timestamps using the best available metadata.
pub fn extract_word_timestamps(
    alignment: &ChunkAlignment,
    graphemes: &str,
    sample_count: usize,
    sample_rate: u32,
) -> Vec<WordTimestamp> {
    let from_tokens = from_tokens(alignment.tokens());
    if !from_tokens.is_empty() {
        return from_tokens;
    }

    let words: Vec<&str> = graphemes.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }

    let total_duration = sample_count as f64 / sample_rate as f64;
    match alignment.duration_ticks() {
        Some(ticks) => proportional(&words, ticks, total_duration),
        None => uniform(&words, total_duration),
    }
}

fn from_tokens(tokens: &[Token]) -> Vec<WordTimestamp> {
    let mut timestamps: Vec<WordTimestamp> = Vec::new();

    for token in tokens {
        let (Some(start), Some(end)) = (token.start, token.end) else {
            continue;
        };

        if !token.text.chars().any(char::is_alphanumeric) {
            if let Some(last) = timestamps.last_mut() {
                last.end = round_secs(end);
            }
            continue;
        }

        timestamps.push(WordTimestamp::new(token.text.clone(), start, end));
    }

    timestamps
}

fn proportional(words: &[&str], ticks: &[f32], total_duration: f64) -> Vec<WordTimestamp> {
    let total_ticks = match ticks.iter().map(|&t| t as f64).sum::<f64>() {
        sum if sum == 0.0 => 1.0,
        sum => sum,
    };
    log::trace!(
        "Allocating {total_duration:.4}s across {} words ({total_ticks} duration ticks)",
        words.len()
    );

    let char_lengths: Vec<usize> = words.iter().map(|w| w.chars().count()).collect();
    let total_chars = char_lengths.iter().sum::<usize>().max(1) as f64;

    let mut cursor = 0.0;
    words
        .iter()
        .zip(&char_lengths)
        .map(|(word, &len)| {
            let word_duration = (len as f64 / total_chars) * total_duration;
            let stamp = WordTimestamp::new(*word, cursor, cursor + word_duration);
            cursor += word_duration;
            stamp
        })
        .collect()
}

fn uniform(words: &[&str], total_duration: f64) -> Vec<WordTimestamp> {
    let per_word = total_duration / words.len() as f64;
    words
        .iter()
        .enumerate()
        .map(|(i, word)| WordTimestamp::new(*word, i as f64 * per_word, (i + 1) as f64 * per_word))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 24_000;

    fn tokens(tokens: Vec<Token>) -> ChunkAlignment {
        ChunkAlignment::TokenAligned {
            tokens,
            duration_ticks: None,
        }
    }

    #[test]
    fn punctuation_extends_previous_word() {
        let alignment = tokens(vec![
            Token::timed("Hello", 0.1, 0.4),
            Token::timed(",", 0.4, 0.45),
            Token::timed("world", 0.5, 0.9),
            Token::timed("!", 0.9, 1.012_34),
        ]);
        let stamps = extract_word_timestamps(&alignment, "Hello, world!", SR as usize, SR);
        assert_eq!(
            stamps,
            vec![
                WordTimestamp::new("Hello", 0.1, 0.45),
                WordTimestamp::new("world", 0.5, 1.0123),
            ]
        );
    }

    #[test]
    fn leading_punctuation_is_dropped() {
        let alignment = tokens(vec![
            Token::timed("\"", 0.0, 0.05),
            Token::timed("quote", 0.05, 0.3),
        ]);
        let stamps = extract_word_timestamps(&alignment, "\"quote", SR as usize, SR);
        assert_eq!(stamps, vec![WordTimestamp::new("quote", 0.05, 0.3)]);
    }

    #[test]
    fn untimed_tokens_are_skipped_without_merging() {
        let alignment = tokens(vec![
            Token::timed("one", 0.0, 0.2),
            Token::untimed("."),
            Token {
                text: "two".into(),
                start: Some(0.3),
                end: None,
            },
            Token::timed("three", 0.4, 0.6),
        ]);
        let stamps = extract_word_timestamps(&alignment, "one. two three", SR as usize, SR);
        assert_eq!(
            stamps,
            vec![
                WordTimestamp::new("one", 0.0, 0.2),
                WordTimestamp::new("three", 0.4, 0.6),
            ]
        );
    }

    #[test]
    fn token_times_are_rounded() {
        let alignment = tokens(vec![Token::timed("word", 0.123_456, 0.987_66)]);
        let stamps = extract_word_timestamps(&alignment, "word", SR as usize, SR);
        assert_eq!(stamps[0].start, 0.1235);
        assert_eq!(stamps[0].end, 0.9877);
    }

    #[test]
    fn unusable_tokens_fall_through_to_ticks() {
        let alignment = ChunkAlignment::TokenAligned {
            tokens: vec![Token::untimed("a"), Token::timed("...", 0.0, 0.1)],
            duration_ticks: Some(vec![10.0, 20.0]),
        };
        let stamps = extract_word_timestamps(&alignment, "a bb ccc", SR as usize, SR);
        assert_eq!(stamps.len(), 3);
        assert_eq!(stamps[1], WordTimestamp::new("bb", 0.1667, 0.5));
    }

    #[test]
    fn unusable_tokens_without_ticks_fall_through_to_uniform() {
        let alignment = tokens(vec![Token::untimed("a"), Token::untimed("b")]);
        let stamps = extract_word_timestamps(&alignment, "a b", SR as usize, SR);
        assert_eq!(
            stamps,
            vec![WordTimestamp::new("a", 0.0, 0.5), WordTimestamp::new("b", 0.5, 1.0)]
        );
    }

    #[test]
    fn proportional_allocation_by_character_length() {
        let alignment = ChunkAlignment::DurationEstimated(vec![20.0, 15.0, 25.0]);
        let stamps = extract_word_timestamps(&alignment, "a bb ccc", 24_000, SR);
        assert_eq!(
            stamps,
            vec![
                WordTimestamp::new("a", 0.0, 0.1667),
                WordTimestamp::new("bb", 0.1667, 0.5),
                WordTimestamp::new("ccc", 0.5, 1.0),
            ]
        );
    }

    #[test]
    fn zero_tick_sum_still_allocates() {
        let alignment = ChunkAlignment::DurationEstimated(vec![0.0, 0.0]);
        let stamps = extract_word_timestamps(&alignment, "ab cd", 12_000, SR);
        assert_eq!(
            stamps,
            vec![WordTimestamp::new("ab", 0.0, 0.25), WordTimestamp::new("cd", 0.25, 0.5)]
        );
    }

    #[test]
    fn proportional_span_covers_chunk_duration() {
        let alignment = ChunkAlignment::DurationEstimated(vec![3.0; 17]);
        let text = "the quick brown fox jumps over the lazy dog";
        let stamps = extract_word_timestamps(&alignment, text, 31_337, SR);
        assert_eq!(stamps.len(), 9);
        assert_eq!(stamps[0].start, 0.0);
        let expected = 31_337.0 / SR as f64;
        assert!((stamps[8].end - expected).abs() <= 1e-4);
        for pair in stamps.windows(2) {
            assert!(pair[0].start <= pair[0].end);
            assert!(pair[0].end <= pair[1].start + 1e-4);
        }
    }

    #[test]
    fn character_length_counts_scalars_not_bytes() {
        let alignment = ChunkAlignment::DurationEstimated(vec![1.0]);
        let stamps = extract_word_timestamps(&alignment, "é ab", 24_000, SR);
        assert_eq!(stamps[0], WordTimestamp::new("é", 0.0, 0.3333));
    }

    #[test]
    fn uniform_fallback_without_metadata() {
        let stamps = extract_word_timestamps(&ChunkAlignment::Unaligned, "one two three four", 48_000, SR);
        let ends: Vec<f64> = stamps.iter().map(|s| s.end).collect();
        assert_eq!(ends, vec![0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn blank_graphemes_yield_nothing() {
        assert!(extract_word_timestamps(&ChunkAlignment::Unaligned, "  \n\t", SR as usize, SR).is_empty());
        assert!(
            extract_word_timestamps(&ChunkAlignment::DurationEstimated(vec![5.0]), "", 0, SR).is_empty()
        );
    }

    #[test]
    fn zero_length_audio_collapses_spans() {
        let stamps = extract_word_timestamps(&ChunkAlignment::Unaligned, "a b", 0, SR);
        assert!(stamps.iter().all(|s| s.start == 0.0 && s.end == 0.0));
    }

    #[test]
    fn rounding_uses_exact_binary_value() {
        assert_eq!(round_secs(54.0 / 24_000.0), 0.0022);
        assert_eq!(round_secs(66.0 / 24_000.0), 0.0027);
        assert_eq!(round_secs(0.000_05), 0.0001);
        assert_eq!(round_secs(-0.123_46), -0.1235);
    }

    #[test]
    fn uniform_end_of_short_chunk_rounds_down_below_half() {
        let stamps = extract_word_timestamps(&ChunkAlignment::Unaligned, "hm", 54, SR);
        assert_eq!(stamps, vec![WordTimestamp::new("hm", 0.0, 0.0022)]);
        assert_eq!(stamps[0].end, 0.0022);
    }

    #[test]
    fn shift_rounds_result() {
        let mut stamp = WordTimestamp::new("x", 0.1667, 0.5);
        stamp.shift(0.08);
        assert_eq!(stamp, WordTimestamp::new("x", 0.2467, 0.58));
    }
}
