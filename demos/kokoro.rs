use std::path::PathBuf;
use std::time::Instant;

use tts_timestamps::engines::kokoro::{KokoroEngine, KokoroModelParams};
use tts_timestamps::{catalog, SynthesisRequest, Synthesizer, SynthesizerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let model_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "models/kokoro".to_string()));

    let load_start = Instant::now();
    let synth = Synthesizer::start(SynthesizerConfig::default(), move |lang| {
        KokoroEngine::load(&model_dir, lang, KokoroModelParams::default())
    })?;
    println!("Preloaded {:?} in {:.2?}", synth.registry().loaded(), load_start.elapsed());

    println!("Catalog voices:");
    for voice in catalog::voices() {
        println!("  {:<12} {:<24} lang={}", voice.id, voice.label, voice.lang);
    }

    let text = "Hello! This is Kokoro, a text to speech model. \
                Every word below comes with its own start and end time.";

    let synth_start = Instant::now();
    let result = synth.synthesize(text, "af_heart", 1.0)?;
    let synth_dur = synth_start.elapsed();
    println!(
        "Synthesized {:.2}s audio in {:.2?} ({:.1}x real-time)",
        result.duration_secs(),
        synth_dur,
        result.duration_secs() / synth_dur.as_secs_f64()
    );
    for ts in &result.timestamps {
        println!("  {:>8.4} {:>8.4}  {}", ts.start, ts.end, ts.word);
    }
    result.write_wav(&PathBuf::from("output.wav"))?;
    println!("Saved to output.wav");

    let request = SynthesisRequest {
        text: "Olá, tudo bem?".to_string(),
        voice: "pf_dora".to_string(),
        speed: 1.0,
    };
    let response = synth.respond(&request)?;
    println!("{}", serde_json::to_string_pretty(&response.timestamps)?);

    synth.shutdown();
    Ok(())
}
