//! # tts-timestamps
//!
//! Text-to-speech synthesis with word-level timestamps.
//!
//! An engine turns text into a stream of audio chunks, each carrying whatever
//! alignment metadata the engine could produce. This crate turns that stream
//! into one continuous, padded audio buffer plus a list of `{word, start, end}`
//! records in global time.
//!
//! ## Features
//!
//! - **Timestamp extraction**: token timings when the engine has them,
//!   duration-proportional or uniform estimates when it does not
//! - **Chunk stitching**: running offsets across chunks and 80 ms edge padding
//! - **Engine registry**: one lazily built engine per language, safe under
//!   concurrent first use
//! - **Kokoro TTS** (feature `kokoro`): Kokoro-82M ONNX engine with espeak-ng
//!   phonemization
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! tts-timestamps = { version = "0.1", features = ["kokoro"] }
//! ```
//!
//! ```ignore
//! use std::path::PathBuf;
//! use tts_timestamps::engines::kokoro::{KokoroEngine, KokoroModelParams};
//! use tts_timestamps::{Synthesizer, SynthesizerConfig};
//!
//! let model_dir = PathBuf::from("models/kokoro");
//! let synth = Synthesizer::start(SynthesizerConfig::default(), move |lang| {
//!     KokoroEngine::load(&model_dir, lang, KokoroModelParams::default())
//! })?;
//!
//! let result = synth.synthesize("Hello, world!", "af_heart", 1.0)?;
//! for ts in &result.timestamps {
//!     println!("{:>8.4} {:>8.4} {}", ts.start, ts.end, ts.word);
//! }
//! result.write_wav(&PathBuf::from("output.wav"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod chunk;
pub mod engines;
pub mod error;
pub mod language;
pub mod registry;
pub mod response;
pub mod stitcher;
pub mod synthesizer;
pub mod timestamps;

use std::io::{Cursor, Seek, Write};
use std::path::Path;

pub use chunk::{ChunkAlignment, SynthesisChunk, Token};
pub use error::{EncodeError, ServiceError};
pub use language::Language;
pub use registry::EngineRegistry;
pub use response::{SynthesisRequest, SynthesisResponse};
pub use stitcher::AudioStitcher;
pub use synthesizer::{Synthesizer, SynthesizerConfig, SynthesizerConfigBuilder};
pub use timestamps::{extract_word_timestamps, WordTimestamp};

/// Output sample rate of the reference configuration.
pub const SAMPLE_RATE: u32 = 24000;

/// The result of a synthesis (text-to-speech) operation.
///
/// Contains raw f32 audio samples, the word timestamps in the same time base,
/// and the sample rate of the output audio.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    /// Raw audio samples as f32 values, padding included
    pub samples: Vec<f32>,
    /// Word timestamps in seconds from the first sample
    pub timestamps: Vec<WordTimestamp>,
    /// Sample rate of the audio
    pub sample_rate: u32,
}

impl SynthesisResult {
    /// Write the audio to a 32-bit float WAV file.
    pub fn write_wav(&self, path: &Path) -> Result<(), EncodeError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(())
    }

    /// Encode the audio as an in-memory 16-bit PCM WAV file.
    ///
    /// An empty result encodes to an empty payload rather than a header-only
    /// file.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        if self.samples.is_empty() {
            return Ok(Vec::new());
        }
        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        write_pcm16(&mut cursor, &self.samples, self.sample_rate)?;
        Ok(cursor.into_inner())
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn write_pcm16<W: Write + Seek>(out: W, samples: &[f32], sample_rate: u32) -> Result<(), EncodeError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(out, spec)?;
    for &sample in samples {
        let clamped = sample.clamp(-1.0, 1.0);
        writer.write_sample((clamped * i16::MAX as f32).round() as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// A one-pass, forward-only sequence of chunks for a single request.
pub type ChunkStream<'a, E> = Box<dyn Iterator<Item = Result<SynthesisChunk, E>> + 'a>;

/// Common interface for text-to-speech synthesis engines.
///
/// An engine is built once per language and shared by concurrent requests, so
/// synthesis takes `&self`. Each call to [`stream`](Self::stream) yields the
/// chunks for one request in text order.
pub trait SynthesisEngine: Send + Sync {
    /// Error raised by construction or by any chunk of the stream.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Start synthesizing `text` with `voice` at `speed` (1.0 = normal).
    fn stream<'a>(
        &'a self,
        text: &'a str,
        voice: &'a str,
        speed: f32,
    ) -> Result<ChunkStream<'a, Self::Error>, Self::Error>;
}
