//! One-shot synthesis from the command line.
//!
//! Loads the model, runs a single job and prints the path of the produced
//! audio file. Worker settings come from the same environment as the server.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use voice_maker::domain::synthesis::{
    AudioContainer, ReferenceAudio, SynthesisService, SynthesisServiceApi, TracingProgress,
    DEFAULT_SPEED,
};
use voice_maker::infrastructure::config::Config;
use voice_maker::infrastructure::engines::XttsWorker;
use voice_maker::infrastructure::storage::{FsTemporaryAudioStore, OutputNamer};

/// Voice Maker: turn text into speech with XTTS v2
#[derive(Debug, Parser)]
#[command(name = "voice-maker-cli", about = "Synthesize speech from text with XTTS v2")]
struct Args {
    /// Text to synthesize
    #[arg(short, long)]
    text: String,

    /// Language code, or `auto` to detect it from the text
    #[arg(short, long, default_value = "fr")]
    language: String,

    /// WAV or MP3 recording of the voice to clone
    #[arg(long)]
    speaker_wav: Option<PathBuf>,

    /// Speaking rate, clamped to 0.5..=1.5
    #[arg(short, long, default_value_t = DEFAULT_SPEED)]
    speed: f32,

    /// Directory for the produced audio (defaults to OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voice_maker=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<PathBuf> {
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    let reference_audio = match &args.speaker_wav {
        Some(path) => Some(read_reference(path).await?),
        None => None,
    };

    let outputs = OutputNamer::new(args.output_dir.unwrap_or(config.output_dir.clone()));
    outputs.ensure_dir().await?;

    let model = XttsWorker::spawn(config.xtts_worker()).await?;

    let service = SynthesisService::new(
        Arc::new(model),
        Arc::new(FsTemporaryAudioStore::new(config.temp_audio_dir.clone())),
        Arc::new(outputs),
        config.supported_languages.clone(),
    );

    let result = service
        .synthesize_request(
            &args.text,
            &args.language,
            reference_audio,
            args.speed,
            &TracingProgress,
        )
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", e.kind().as_str(), e))?;

    tracing::info!(
        language = %result.language,
        device = %result.device,
        elapsed_ms = result.elapsed.as_millis() as u64,
        estimated_duration_seconds = result.estimated_duration_seconds,
        "Audio generated"
    );

    Ok(result.output_path)
}

async fn read_reference(path: &std::path::Path) -> anyhow::Result<ReferenceAudio> {
    let file_name = path.file_name().and_then(|n| n.to_str());
    let container = AudioContainer::detect(None, file_name).ok_or_else(|| {
        anyhow::anyhow!("reference audio must be a .wav or .mp3 file: {}", path.display())
    })?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;

    Ok(ReferenceAudio::new(bytes, container))
}
