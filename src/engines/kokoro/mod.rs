//! Kokoro-82M engine: espeak-ng phonemes in, 24 kHz audio and per-phoneme
//! durations out.
//!
//! One [`KokoroEngine`] serves one language. It needs the `espeak-ng` binary
//! on `PATH` (or at [`EspeakConfig::bin_path`]) and a model directory:
//!
//! ```text
//! models/kokoro/
//! ├── kokoro-quant-convinteger.onnx   # preferred; any *.onnx is accepted
//! ├── voices-v1.0.bin                  # npz archive of style tables
//! └── config.json                      # optional vocab override
//! ```
//!
//! # Chunks and Alignment
//!
//! Input text is split into sentences and each sentence becomes one or more
//! chunks of at most 510 phoneme tokens.
//!
//! - English voices (`a`, `b`) are phonemized word by word. When the model
//!   exports per-phoneme durations, every word gets a start and end time and
//!   chunks are [`TokenAligned`](crate::ChunkAlignment::TokenAligned).
//! - Other languages are phonemized a sentence at a time and chunks carry the
//!   raw durations ([`DurationEstimated`](crate::ChunkAlignment::DurationEstimated)).
//! - Exports without a duration output produce
//!   [`Unaligned`](crate::ChunkAlignment::Unaligned) chunks.
//!
//! # Language Support
//!
//! | Voice prefix | Language | espeak-ng code |
//! |---|---|---|
//! | `af_`, `am_` | American English | `en-us` |
//! | `bf_`, `bm_` | British English | `en-gb` |
//! | `ef_`, `em_` | Spanish | `es` |
//! | `ff_` | French | `fr` |
//! | `hf_`, `hm_` | Hindi | `hi` |
//! | `if_`, `im_` | Italian | `it` |
//! | `jf_`, `jm_` | Japanese | `ja` |
//! | `pf_`, `pm_` | Brazilian Portuguese | `pt-br` |
//! | `zf_`, `zm_` | Mandarin Chinese | `cmn` |

pub mod engine;
pub mod model;
pub mod phonemizer;
pub mod stream;
pub mod vocab;
pub mod voices;

pub use engine::{KokoroEngine, KokoroModelParams};
pub use model::KokoroError;
pub use phonemizer::EspeakConfig;
