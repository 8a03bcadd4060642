use std::collections::VecDeque;
use std::ops::Range;

use crate::chunk::{ChunkAlignment, SynthesisChunk, Token};
use crate::SAMPLE_RATE;

use super::engine::KokoroEngine;
use super::model::{phoneme_boundaries, Inference, KokoroError, MAX_PHONEME_LEN};
use super::phonemizer::{join_parts, phonemize, phonemize_parts, split_words, PhonemizedPart};

/// Chunks for one request, synthesized lazily sentence by sentence.
pub struct KokoroStream<'a> {
    engine: &'a KokoroEngine,
    voice: &'a str,
    speed: f32,
    sentences: VecDeque<String>,
    /// Phonemized words of the current sentence not yet synthesized.
    pending: VecDeque<PhonemizedPart>,
}

impl<'a> KokoroStream<'a> {
    pub(super) fn new(engine: &'a KokoroEngine, sentences: Vec<String>, voice: &'a str, speed: f32) -> Self {
        Self {
            engine,
            voice,
            speed,
            sentences: sentences.into(),
            pending: VecDeque::new(),
        }
    }

    fn next_chunk(&mut self) -> Result<Option<SynthesisChunk>, KokoroError> {
        let lang = self.engine.language();
        loop {
            if self.pending.is_empty() {
                let Some(sentence) = self.sentences.pop_front() else {
                    return Ok(None);
                };

                if !lang.is_word_aligned() {
                    match self.sentence_chunk(&sentence)? {
                        Some(chunk) => return Ok(Some(chunk)),
                        None => continue,
                    }
                }

                let parts = phonemize_parts(
                    split_words(&sentence),
                    lang.espeak_code(),
                    self.engine.vocab(),
                    self.engine.espeak(),
                )?;
                self.pending = parts.into();
            }

            let packed = pack_parts(&mut self.pending, self.engine.vocab().space_id());
            if packed.ids.is_empty() {
                continue;
            }
            return self.word_chunk(packed).map(Some);
        }
    }

    /// Whole-sentence chunk with phoneme durations as the only alignment.
    fn sentence_chunk(&self, sentence: &str) -> Result<Option<SynthesisChunk>, KokoroError> {
        let lang = self.engine.language();
        let mut ids = phonemize(sentence, lang.espeak_code(), self.engine.vocab(), self.engine.espeak())?;
        if ids.is_empty() {
            log::warn!("No phoneme tokens produced for text: {sentence:?}");
            return Ok(None);
        }
        if ids.len() > MAX_PHONEME_LEN {
            log::warn!(
                "Phoneme sequence for {sentence:?} exceeds {MAX_PHONEME_LEN} tokens ({}), truncating",
                ids.len()
            );
            ids.truncate(MAX_PHONEME_LEN);
        }

        let Inference { audio, durations } = self.engine.infer(&ids, self.voice, self.speed)?;
        let alignment = match durations {
            Some(ticks) => ChunkAlignment::DurationEstimated(ticks),
            None => ChunkAlignment::Unaligned,
        };
        Ok(Some(SynthesisChunk::new(audio, sentence, alignment)))
    }

    /// Chunk of whole words, timed from the model's durations when available.
    fn word_chunk(&self, packed: PackedChunk) -> Result<SynthesisChunk, KokoroError> {
        let Inference { audio, durations } = self.engine.infer(&packed.ids, self.voice, self.speed)?;
        let graphemes = join_parts(packed.parts.iter().map(|p| &p.part));

        let alignment = match durations {
            Some(ticks) => ChunkAlignment::TokenAligned {
                tokens: timed_tokens(&packed, &ticks),
                duration_ticks: Some(ticks),
            },
            None => ChunkAlignment::Unaligned,
        };
        Ok(SynthesisChunk::new(audio, graphemes, alignment))
    }
}

impl Iterator for KokoroStream<'_> {
    type Item = Result<SynthesisChunk, KokoroError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.next_chunk();
        if next.is_err() {
            self.sentences.clear();
            self.pending.clear();
        }
        next.transpose()
    }
}

/// Phoneme IDs for one model call and the span each word occupies in them.
#[derive(Debug, Default, PartialEq)]
struct PackedChunk {
    parts: Vec<PhonemizedPart>,
    ids: Vec<i64>,
    spans: Vec<Range<usize>>,
}

/// Take whole words from the front of `pending` while they fit in
/// [`MAX_PHONEME_LEN`] IDs. A single word longer than the limit is truncated.
fn pack_parts(pending: &mut VecDeque<PhonemizedPart>, space_id: Option<i64>) -> PackedChunk {
    let mut packed = PackedChunk::default();

    while let Some(next) = pending.front() {
        let space = usize::from(
            next.part.space_before && !next.ids.is_empty() && !packed.ids.is_empty() && space_id.is_some(),
        );
        if !packed.ids.is_empty() && packed.ids.len() + space + next.ids.len() > MAX_PHONEME_LEN {
            break;
        }
        let Some(mut part) = pending.pop_front() else {
            break;
        };

        if space == 1 {
            packed.ids.extend(space_id);
        }
        if part.ids.len() > MAX_PHONEME_LEN {
            log::warn!(
                "Word {:?} has {} phoneme tokens, truncating to {MAX_PHONEME_LEN}",
                part.part.text,
                part.ids.len()
            );
            part.ids.truncate(MAX_PHONEME_LEN);
        }

        let start = packed.ids.len();
        packed.ids.extend_from_slice(&part.ids);
        packed.spans.push(start..packed.ids.len());
        packed.parts.push(part);
    }

    packed
}

/// Attach start/end times to each word from per-phoneme durations. Words
/// without phonemes, or a duration sequence that does not match the chunk,
/// leave tokens untimed.
fn timed_tokens(packed: &PackedChunk, durations: &[f32]) -> Vec<Token> {
    let matches_chunk = durations.len() == packed.ids.len() + 2;
    if !matches_chunk {
        log::warn!(
            "Duration output has {} entries for {} phoneme tokens; words left untimed",
            durations.len(),
            packed.ids.len()
        );
    }
    let bounds = phoneme_boundaries(durations, SAMPLE_RATE);

    packed
        .parts
        .iter()
        .zip(&packed.spans)
        .map(|(part, span)| {
            let text = part.part.text.clone();
            if !matches_chunk || span.is_empty() {
                Token::untimed(text)
            } else {
                Token::timed(text, bounds[span.start], bounds[span.end])
            }
        })
        .collect()
}
