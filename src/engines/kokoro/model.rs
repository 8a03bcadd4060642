use std::io;
use std::path::{Path, PathBuf};

use ndarray::{arr1, Array2, ArrayView2};
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionOutputs};
use ort::value::TensorRef;

use super::vocab::Vocab;
use super::voices::Style;

/// Phoneme IDs one model call accepts, not counting the two pad tokens.
pub const MAX_PHONEME_LEN: usize = 510;

/// Length of one voice style vector.
pub const STYLE_DIM: usize = 256;

/// Audio samples produced per predicted duration tick.
pub const SAMPLES_PER_TICK: usize = 600;

const PREFERRED_MODEL: &str = "kokoro-quant-convinteger.onnx";
const CONFIG_FILE: &str = "config.json";

/// Output names under which Kokoro exports publish per-phoneme durations.
const DURATION_OUTPUTS: &[&str] = &["durations", "duration", "pred_dur"];

#[derive(thiserror::Error, Debug)]
pub enum KokoroError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error(
        "espeak-ng is required for phonemization but was not found \
         (apt-get install espeak-ng / brew install espeak-ng / https://espeak-ng.org/download)"
    )]
    EspeakNotFound,
    #[error("phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("unknown voice '{0}'")]
    VoiceNotFound(String),
    #[error("bad vocabulary in config.json: {0}")]
    Config(String),
    #[error("bad voice archive: {0}")]
    VoiceParse(String),
    #[error("model returned no waveform")]
    NoWaveform,
}

/// Audio for one chunk plus the model's per-token durations, if it exports
/// them. Durations cover the padded token sequence (leading and trailing pad
/// included).
#[derive(Debug, Clone, PartialEq)]
pub struct Inference {
    pub audio: Vec<f32>,
    pub durations: Option<Vec<f32>>,
}

/// Element type of the `speed` input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedInput {
    Int32,
    Float32,
}

/// Input and output names that differ between Kokoro exports.
#[derive(Debug, Clone)]
struct Signature {
    tokens_input: String,
    speed: SpeedInput,
    durations_output: Option<String>,
}

impl Signature {
    fn detect(session: &Session) -> Self {
        let tokens_input = session
            .inputs()
            .iter()
            .map(|input| input.name())
            .find(|name| *name == "input_ids" || *name == "tokens")
            .unwrap_or("input_ids")
            .to_string();

        // Exports that do not describe `speed` are the newer int32 ones.
        let speed = session
            .inputs()
            .iter()
            .find(|input| input.name() == "speed")
            .map_or(SpeedInput::Int32, |input| {
                let dtype = format!("{:?}", input.dtype()).to_ascii_lowercase();
                if dtype.contains("int32") {
                    SpeedInput::Int32
                } else {
                    SpeedInput::Float32
                }
            });

        let durations_output = session
            .outputs()
            .iter()
            .map(|output| output.name())
            .find(|name| DURATION_OUTPUTS.contains(name))
            .map(str::to_string);

        Self {
            tokens_input,
            speed,
            durations_output,
        }
    }
}

/// Kokoro ONNX session and its vocabulary.
pub struct KokoroModel {
    session: Session,
    signature: Signature,
    vocab: Vocab,
}

impl KokoroModel {
    /// Load the model in `model_dir`.
    ///
    /// The directory holds an `.onnx` export (the quantized one is preferred)
    /// and optionally a `config.json` whose `vocab` replaces the builtin table.
    pub fn load(
        model_dir: &Path,
        num_threads: Option<usize>,
        optimized_cache_path: Option<&Path>,
    ) -> Result<Self, KokoroError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading Kokoro model from {}", onnx_path.display());

        let session = init_session(&onnx_path, num_threads, optimized_cache_path)?;
        let signature = Signature::detect(&session);
        log::info!("Kokoro export signature: {signature:?}");

        let config_path = model_dir.join(CONFIG_FILE);
        let vocab = if config_path.exists() {
            log::info!("Loading vocab from {}", config_path.display());
            Vocab::from_config(&config_path)?
        } else {
            log::warn!("{CONFIG_FILE} not found, using builtin vocab");
            Vocab::builtin()
        };
        log::info!("Vocab has {} symbols", vocab.len());

        Ok(Self {
            session,
            signature,
            vocab,
        })
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    /// Whether [`Inference::durations`] will be populated.
    pub fn has_durations(&self) -> bool {
        self.signature.durations_output.is_some()
    }

    /// Run the model on one chunk of at most [`MAX_PHONEME_LEN`] phoneme IDs.
    pub fn infer(&mut self, tokens: &[i64], style: &Style, speed: f32) -> Result<Inference, KokoroError> {
        let mut padded = Vec::with_capacity(tokens.len() + 2);
        padded.push(0);
        padded.extend_from_slice(tokens);
        padded.push(0);
        let tokens_arr = Array2::from_shape_vec((1, padded.len()), padded)?;
        let style_view = ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;

        let Signature {
            tokens_input,
            speed: speed_input,
            durations_output,
        } = &self.signature;
        let outputs = match speed_input {
            SpeedInput::Int32 => {
                let speed_arr = arr1(&[speed as i32]);
                self.session.run(inputs![
                    tokens_input.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                    "style" => TensorRef::from_array_view(style_view)?,
                    "speed" => TensorRef::from_array_view(speed_arr.view())?,
                ])?
            }
            SpeedInput::Float32 => {
                let speed_arr = arr1(&[speed]);
                self.session.run(inputs![
                    tokens_input.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                    "style" => TensorRef::from_array_view(style_view)?,
                    "speed" => TensorRef::from_array_view(speed_arr.view())?,
                ])?
            }
        };

        read_outputs(&outputs, durations_output.as_deref())
    }
}

/// Split session outputs into the waveform and the duration tensor.
fn read_outputs(outputs: &SessionOutputs<'_>, durations_output: Option<&str>) -> Result<Inference, KokoroError> {
    let mut audio: Option<Vec<f32>> = None;
    let mut durations: Option<Vec<f32>> = None;

    for (name, value) in outputs.iter() {
        if Some(name) == durations_output {
            // Some exports emit integer tick counts.
            durations = Some(match value.try_extract_array::<f32>() {
                Ok(view) => view.iter().copied().collect(),
                Err(_) => value
                    .try_extract_array::<i64>()?
                    .iter()
                    .map(|&d| d as f32)
                    .collect(),
            });
        } else if audio.is_none() {
            audio = Some(value.try_extract_array::<f32>()?.iter().copied().collect());
        }
    }

    Ok(Inference {
        audio: audio.ok_or(KokoroError::NoWaveform)?,
        durations,
    })
}

fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, KokoroError> {
    let preferred = model_dir.join(PREFERRED_MODEL);
    if preferred.exists() {
        return Ok(preferred);
    }

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(model_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "onnx") {
            candidates.push(path);
        }
    }
    candidates.sort();

    match candidates.into_iter().next() {
        Some(path) => {
            log::info!("{PREFERRED_MODEL} not found, using {}", path.display());
            Ok(path)
        }
        None => Err(KokoroError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no .onnx export in {}", model_dir.display()),
        ))),
    }
}

/// Build the ONNX session. With a cache path, the first load writes the
/// Level3-optimized graph there and later loads read it back unoptimized.
fn init_session(
    onnx_path: &Path,
    num_threads: Option<usize>,
    optimized_cache_path: Option<&Path>,
) -> Result<Session, KokoroError> {
    let cached = optimized_cache_path.filter(|cache| cache.exists());
    let (load_path, opt_level) = match cached {
        Some(cache) => {
            log::info!("Loading optimized Kokoro graph from {}", cache.display());
            (cache, GraphOptimizationLevel::Disable)
        }
        None => (onnx_path, GraphOptimizationLevel::Level3),
    };

    let mut builder = Session::builder()?
        .with_optimization_level(opt_level)?
        .with_execution_providers(vec![CPUExecutionProvider::default().build()])?
        .with_parallel_execution(true)?;

    if let (None, Some(cache)) = (cached, optimized_cache_path) {
        log::info!("Saving optimized Kokoro graph to {}", cache.display());
        builder = builder.with_optimized_model_path(cache)?;
    }
    if let Some(threads) = num_threads {
        builder = builder.with_intra_threads(threads)?.with_inter_threads(threads)?;
    }

    Ok(builder.commit_from_file(load_path)?)
}

/// Chunk-relative seconds at which each tick boundary falls.
///
/// `durations` covers the padded sequence, so entry `k` of the result is the
/// time at which phoneme `k` of the unpadded chunk starts; the final entry is
/// where the last phoneme ends.
pub fn phoneme_boundaries(durations: &[f32], sample_rate: u32) -> Vec<f64> {
    let to_secs = |ticks: f64| ticks * SAMPLES_PER_TICK as f64 / sample_rate as f64;
    let mut elapsed = durations.first().map_or(0.0, |&d| d.max(0.0) as f64);
    let inner = durations.len().saturating_sub(2);

    let mut bounds = Vec::with_capacity(inner + 1);
    bounds.push(to_secs(elapsed));
    for &ticks in durations.iter().skip(1).take(inner) {
        elapsed += ticks.max(0.0) as f64;
        bounds.push(to_secs(elapsed));
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_skip_leading_pad() {
        // pad, three phonemes, pad
        let bounds = phoneme_boundaries(&[2.0, 4.0, 0.0, 8.0, 3.0], 24_000);
        assert_eq!(bounds, vec![0.05, 0.15, 0.15, 0.35]);
    }

    #[test]
    fn boundaries_clamp_negative_ticks() {
        let bounds = phoneme_boundaries(&[-1.0, 4.0, -2.0], 24_000);
        assert_eq!(bounds, vec![0.0, 0.1]);
    }

    #[test]
    fn boundaries_of_empty_durations() {
        assert_eq!(phoneme_boundaries(&[], 24_000), vec![0.0]);
    }

    #[test]
    fn prefers_quantized_export_then_first_by_name() {
        let dir = std::env::temp_dir().join(format!("kokoro-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.onnx"), b"").unwrap();
        std::fs::write(dir.join("a.onnx"), b"").unwrap();
        assert_eq!(find_onnx_file(&dir).unwrap(), dir.join("a.onnx"));

        std::fs::write(dir.join(PREFERRED_MODEL), b"").unwrap();
        assert_eq!(find_onnx_file(&dir).unwrap(), dir.join(PREFERRED_MODEL));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_export_is_not_found() {
        let dir = std::env::temp_dir().join(format!("kokoro-empty-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let err = find_onnx_file(&dir).unwrap_err();
        assert!(matches!(err, KokoroError::Io(ref e) if e.kind() == io::ErrorKind::NotFound));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
