//! Request orchestration: engine lookup, stream draining, stitching.

use std::time::Duration;

use derive_builder::Builder;

use crate::error::ServiceError;
use crate::language::Language;
use crate::registry::EngineRegistry;
use crate::response::{SynthesisRequest, SynthesisResponse};
use crate::stitcher::{AudioStitcher, DEFAULT_PADDING};
use crate::{SynthesisEngine, SynthesisResult, SAMPLE_RATE};

/// Service-level settings.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default)]
pub struct SynthesizerConfig {
    /// Sample rate the engines produce.
    pub sample_rate: u32,
    /// Silence added to each end of the final audio.
    pub padding: Duration,
    /// Languages whose engines are built by [`Synthesizer::start`].
    #[builder(setter(into))]
    pub preload: Vec<Language>,
    /// Voice handed to the engine when a request passes an empty one. It does
    /// not affect language selection.
    #[builder(setter(into))]
    pub default_voice: String,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            padding: DEFAULT_PADDING,
            preload: vec![Language::BASELINE],
            default_voice: "af_heart".to_string(),
        }
    }
}

/// Turns text into a padded audio buffer with word timestamps.
///
/// Owns the engine registry for its whole lifetime. Requests may run
/// concurrently from any number of threads; each one drains its own chunk
/// stream synchronously.
pub struct Synthesizer<E: SynthesisEngine> {
    config: SynthesizerConfig,
    registry: EngineRegistry<E>,
}

impl<E: SynthesisEngine> Synthesizer<E> {
    /// Create a synthesizer that builds engines on first use.
    pub fn new<F>(config: SynthesizerConfig, factory: F) -> Self
    where
        F: Fn(Language) -> Result<E, E::Error> + Send + Sync + 'static,
    {
        Self {
            config,
            registry: EngineRegistry::new(factory),
        }
    }

    /// Create a synthesizer and build the engines listed in
    /// [`SynthesizerConfig::preload`].
    pub fn start<F>(config: SynthesizerConfig, factory: F) -> Result<Self, E::Error>
    where
        F: Fn(Language) -> Result<E, E::Error> + Send + Sync + 'static,
    {
        let synth = Self::new(config, factory);
        synth.registry.preload(&synth.config.preload)?;
        Ok(synth)
    }

    pub fn config(&self) -> &SynthesizerConfig {
        &self.config
    }

    pub fn registry(&self) -> &EngineRegistry<E> {
        &self.registry
    }

    /// Synthesize `text` and collect word timestamps.
    ///
    /// The language comes from the voice id prefix as given, so an empty voice
    /// selects [`Language::BASELINE`]. The engine's chunk stream is consumed to
    /// the end; the first chunk error aborts the request and nothing stitched
    /// so far is returned.
    pub fn synthesize(&self, text: &str, voice: &str, speed: f32) -> Result<SynthesisResult, E::Error> {
        let lang = Language::for_voice(voice);
        let voice = if voice.is_empty() {
            self.config.default_voice.as_str()
        } else {
            voice
        };
        let engine = self.registry.get(lang)?;

        log::debug!("Synthesizing {} chars with voice '{voice}' (lang_code='{lang}', speed={speed})", text.len());
        let mut stitcher = AudioStitcher::with_padding(self.config.sample_rate, self.config.padding);
        for chunk in engine.stream(text, voice, speed)? {
            stitcher.push(chunk?);
        }

        log::debug!(
            "Stream finished after {} chunk(s), {:.4}s of audio; padding",
            stitcher.chunk_count(),
            stitcher.offset()
        );
        Ok(stitcher.finish())
    }

    /// Serve one request: synthesize, then encode the audio for transport.
    pub fn respond(&self, request: &SynthesisRequest) -> Result<SynthesisResponse, ServiceError<E::Error>> {
        let result = self
            .synthesize(&request.text, &request.voice, request.speed)
            .map_err(ServiceError::Synthesis)?;
        Ok(SynthesisResponse::from_result(result)?)
    }

    /// Release every cached engine.
    pub fn shutdown(self) {
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_pads_80ms_at_24khz() {
        let config = SynthesizerConfig::default();
        assert_eq!(config.sample_rate, 24_000);
        assert_eq!(config.padding, Duration::from_millis(80));
        assert_eq!(config.preload, vec![Language::AmericanEnglish]);
        assert_eq!(config.default_voice, "af_heart");
    }

    #[test]
    fn builder_fills_unset_fields_with_defaults() {
        let config = SynthesizerConfigBuilder::default()
            .padding(Duration::ZERO)
            .preload(vec![Language::BritishEnglish, Language::BrazilianPortuguese])
            .build()
            .unwrap();
        assert_eq!(config.sample_rate, SAMPLE_RATE);
        assert_eq!(config.padding, Duration::ZERO);
        assert_eq!(config.preload.len(), 2);
        assert_eq!(config.default_voice, "af_heart");
    }
}
