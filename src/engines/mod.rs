//! Bundled [`SynthesisEngine`](crate::SynthesisEngine) implementations.
//!
//! Each engine sits behind a Cargo feature:
//! - `kokoro`: Kokoro-82M over ONNX Runtime, phonemized with espeak-ng

#[cfg(feature = "kokoro")]
pub mod kokoro;
