//! Request and response bodies of the synthesis endpoint.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::EncodeError;
use crate::timestamps::WordTimestamp;
use crate::SynthesisResult;

fn default_voice() -> String {
    "af_heart".to_string()
}

fn default_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: default_voice(),
            speed: default_speed(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResponse {
    /// Base64-encoded WAV, or `""` when nothing was synthesized.
    pub audio: String,
    pub timestamps: Vec<WordTimestamp>,
    pub sample_rate: u32,
}

impl SynthesisResponse {
    pub fn from_result(result: SynthesisResult) -> Result<Self, EncodeError> {
        let wav = result.to_wav_bytes()?;
        Ok(Self {
            audio: BASE64.encode(wav),
            timestamps: result.timestamps,
            sample_rate: result.sample_rate,
        })
    }

    /// Decoded WAV bytes of the audio payload.
    pub fn wav_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(&self.audio)
    }
}
