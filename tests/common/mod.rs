//! Scripted in-memory engine for driving the synthesizer without a model.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tts_timestamps::{ChunkAlignment, ChunkStream, Language, SynthesisChunk, SynthesisEngine};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("engine construction failed for lang_code='{0}'")]
    Construct(Language),
    #[error("chunk {0} failed")]
    Chunk(usize),
}

pub type Script = Arc<dyn Fn(&str, &str, f32) -> Vec<Result<SynthesisChunk, ScriptError>> + Send + Sync>;

/// Replays a fixed list of chunks for every request, counting how many are
/// pulled from the stream.
pub struct ScriptedEngine {
    pub lang: Language,
    script: Script,
    pub pulled: Arc<AtomicUsize>,
}

impl ScriptedEngine {
    pub fn new(lang: Language, script: Script) -> Self {
        Self {
            lang,
            script,
            pulled: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl SynthesisEngine for ScriptedEngine {
    type Error = ScriptError;

    fn stream<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
        speed: f32,
    ) -> Result<ChunkStream<'a, Self::Error>, Self::Error> {
        let pulled = Arc::clone(&self.pulled);
        let chunks = (self.script)(text, voice, speed);
        Ok(Box::new(chunks.into_iter().inspect(move |_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        })))
    }
}

/// One chunk per `|`-separated segment of the text, 0.25 s of audio per word,
/// no alignment metadata. A segment reading `FAIL` yields an error.
pub fn segments_script() -> Script {
    Arc::new(|text: &str, _voice: &str, _speed: f32| {
        text.split('|')
            .enumerate()
            .filter(|(_, segment)| !segment.trim().is_empty())
            .map(|(i, segment)| {
                if segment.trim() == "FAIL" {
                    return Err(ScriptError::Chunk(i));
                }
                let words = segment.split_whitespace().count();
                Ok(SynthesisChunk::new(
                    vec![0.25; words * 6000],
                    segment.trim(),
                    ChunkAlignment::Unaligned,
                ))
            })
            .collect()
    })
}

/// The same chunks for every request.
pub fn fixed_script(chunks: Vec<SynthesisChunk>) -> Script {
    Arc::new(move |_: &str, _: &str, _: f32| chunks.iter().cloned().map(Ok).collect())
}
