use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::language::Language;
use crate::{ChunkStream, SynthesisEngine};

use super::model::{Inference, KokoroError, KokoroModel};
use super::phonemizer::{split_sentences, EspeakConfig};
use super::stream::KokoroStream;
use super::vocab::Vocab;
use super::voices::VoiceStore;

/// Parameters for configuring Kokoro model loading.
#[derive(Debug, Clone, Default)]
pub struct KokoroModelParams {
    /// Number of CPU threads to use for inference.
    /// `None` uses the ORT default (typically all available cores).
    pub num_threads: Option<usize>,
    /// Path for caching the Level3-optimized ONNX graph.
    ///
    /// - First load: ORT runs Level3 optimization and serialises the result here.
    /// - Subsequent loads: the pre-built graph is loaded at `Disable` optimization,
    ///   skipping the expensive re-optimization step entirely.
    ///
    /// Must be writable; bundled resource directories may be read-only.
    pub optimized_model_cache_path: Option<PathBuf>,
    /// espeak-ng binary and data location.
    pub espeak: EspeakConfig,
}

/// Kokoro text-to-speech engine for one language.
///
/// The ONNX session is guarded by a mutex: concurrent requests share the
/// engine, phonemize and look up voices in parallel, but run inference one
/// chunk at a time.
///
/// ```rust,no_run
/// use tts_timestamps::engines::kokoro::{KokoroEngine, KokoroModelParams};
/// use tts_timestamps::{Language, SynthesisEngine};
/// use std::path::Path;
///
/// let engine = KokoroEngine::load(
///     Path::new("models/kokoro"),
///     Language::BritishEnglish,
///     KokoroModelParams::default(),
/// )?;
/// for chunk in engine.stream("Hello, world!", "bf_emma", 1.0)? {
///     let chunk = chunk?;
///     println!("{} samples for {:?}", chunk.audio.len(), chunk.graphemes);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct KokoroEngine {
    language: Language,
    model: Mutex<KokoroModel>,
    vocab: Vocab,
    voices: VoiceStore,
    espeak: EspeakConfig,
}

impl KokoroEngine {
    /// Load the model in `model_dir` for `language`.
    pub fn load(model_dir: &Path, language: Language, params: KokoroModelParams) -> Result<Self, KokoroError> {
        let model = KokoroModel::load(
            model_dir,
            params.num_threads,
            params.optimized_model_cache_path.as_deref(),
        )?;
        let voices = VoiceStore::open_dir(model_dir)?;
        if !model.has_durations() {
            log::warn!("Kokoro export has no duration output; word timestamps will be estimated");
        }

        Ok(Self {
            language,
            vocab: model.vocab().clone(),
            voices,
            model: Mutex::new(model),
            espeak: params.espeak,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// All available voice names, sorted.
    pub fn list_voices(&self) -> Vec<&str> {
        self.voices.list_voices()
    }

    pub(super) fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub(super) fn espeak(&self) -> &EspeakConfig {
        &self.espeak
    }

    pub(super) fn infer(&self, ids: &[i64], voice: &str, speed: f32) -> Result<Inference, KokoroError> {
        let style = self.voices.style(voice, ids.len())?;
        self.model.lock().infer(ids, style, speed)
    }
}

impl SynthesisEngine for KokoroEngine {
    type Error = KokoroError;

    fn stream<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
        speed: f32,
    ) -> Result<ChunkStream<'a, Self::Error>, Self::Error> {
        if !self.voices.contains(voice) {
            return Err(KokoroError::VoiceNotFound(voice.to_string()));
        }
        Ok(Box::new(KokoroStream::new(self, split_sentences(text), voice, speed)))
    }
}
