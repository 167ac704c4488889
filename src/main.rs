use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voice_maker::controllers::synthesis::SynthesisController;
use voice_maker::domain::synthesis::SynthesisService;
use voice_maker::infrastructure::config::{Config, LogFormat};
use voice_maker::infrastructure::engines::{AudioModelPort, XttsWorker};
use voice_maker::infrastructure::http::{build_router, start_http_server};
use voice_maker::infrastructure::storage::{FsTemporaryAudioStore, OutputNamer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!("Starting Voice Maker on {}:{}", config.host, config.port);
    if config.is_development() {
        tracing::debug!(config = ?config, "Loaded configuration");
    }

    // Load the model once; every job reuses it
    tracing::info!(
        model = %config.xtts_model_name,
        device = config.xtts_device.as_str(),
        "Loading XTTS model..."
    );
    let model = Arc::new(XttsWorker::spawn(config.xtts_worker()).await?);
    tracing::info!(device = %model.device(), "XTTS model ready");

    // Prepare storage
    let outputs = Arc::new(OutputNamer::new(config.output_dir.clone()));
    outputs.ensure_dir().await?;
    tracing::info!(output_dir = %outputs.dir().display(), "Output directory ready");

    let store = Arc::new(FsTemporaryAudioStore::new(config.temp_audio_dir.clone()));

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate services (inject model and storage)
    tracing::info!("Instantiating services...");
    let synthesis_service = Arc::new(SynthesisService::new(
        model,
        store,
        outputs,
        config.supported_languages.clone(),
    ));

    // 2. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let synthesis_controller = Arc::new(SynthesisController::new(
        synthesis_service.clone(),
        config.max_text_chars,
        config.max_reference_audio_bytes,
    ));

    // Start HTTP server with all routes
    let app = build_router(synthesis_service, synthesis_controller);
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voice_maker=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voice_maker=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
