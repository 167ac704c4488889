use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use voice_maker::controllers::synthesis::SynthesisController;
use voice_maker::domain::synthesis::{LanguageCode, SynthesisService};
use voice_maker::infrastructure::config::parse_languages;
use voice_maker::infrastructure::engines::{AudioModelPort, Device, ModelError, SynthesisCall};
use voice_maker::infrastructure::http::build_router;
use voice_maker::infrastructure::storage::{FsTemporaryAudioStore, OutputNamer};


use api_client::TestClient;

pub const DEFAULT_LANGUAGES: &str = "fr,en,es,de,it";
pub const MAX_TEXT_CHARS: usize = 500;
pub const MAX_REFERENCE_AUDIO_BYTES: usize = 64 * 1024;

/// Smallest well-formed WAV header, no samples
pub const EMPTY_WAV: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00\x01\x00\x01\x00\x80\x3e\x00\x00\x00\x7d\x00\x00\x02\x00\x10\x00data\x00\x00\x00\x00";

/// What the fake model saw on one call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub text: String,
    pub language: String,
    pub speed: f32,
    pub speaker_wav: Option<PathBuf>,
    /// Bytes of the reference sample, read while the call was in flight
    pub speaker_bytes: Option<Vec<u8>>,
}

/// Stand-in for the XTTS worker: writes a WAV header to the output path and
/// rejects languages XTTS does not know, with XTTS's own message.
pub struct FakeModel {
    calls: Mutex<Vec<RecordedCall>>,
    available: AtomicBool,
}

impl Default for FakeModel {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl FakeModel {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Simulate the worker process dying
    pub fn crash(&self) {
        self.available.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioModelPort for FakeModel {
    async fn synthesize(&self, call: SynthesisCall<'_>) -> Result<PathBuf, ModelError> {
        let speaker_bytes = match call.speaker_wav {
            Some(path) => Some(std::fs::read(path).map_err(|e| ModelError::new(e.to_string()))?),
            None => None,
        };

        self.calls.lock().unwrap().push(RecordedCall {
            text: call.text.to_string(),
            language: call.language.to_string(),
            speed: call.speed,
            speaker_wav: call.speaker_wav.map(Path::to_path_buf),
            speaker_bytes,
        });

        if !call.language.is_known_to_xtts() {
            return Err(ModelError::new(format!(
                "Language {} is not supported.",
                call.language
            )));
        }

        tokio::fs::write(call.output_path, EMPTY_WAV)
            .await
            .map_err(|e| ModelError::new(e.to_string()))?;
        Ok(call.output_path.to_path_buf())
    }

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn name(&self) -> &str {
        "fake-xtts"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub model: Arc<FakeModel>,
    pub languages: Vec<LanguageCode>,
    dir: TempDir,
}

impl TestContext {
    /// Start a server offering the given comma separated languages
    pub async fn start(languages: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let languages = parse_languages(languages);

        let model = Arc::new(FakeModel::default());
        let outputs = Arc::new(OutputNamer::new(dir.path().join("output")));
        outputs
            .ensure_dir()
            .await
            .expect("Failed to create output dir");
        let store = Arc::new(FsTemporaryAudioStore::new(dir.path().join("tmp")));

        let synthesis_service = Arc::new(SynthesisService::new(
            model.clone(),
            store,
            outputs,
            languages.clone(),
        ));
        let synthesis_controller = Arc::new(SynthesisController::new(
            synthesis_service.clone(),
            MAX_TEXT_CHARS,
            MAX_REFERENCE_AUDIO_BYTES,
        ));
        let app = build_router(synthesis_service, synthesis_controller);

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to get local addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            client: TestClient::new(&base_url),
            model,
            languages,
            dir,
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    /// Files left in the temporary reference audio directory
    pub fn temp_files(&self) -> Vec<PathBuf> {
        list_files(&self.dir.path().join("tmp"))
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        list_files(&self.output_dir())
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        TestContext::start(DEFAULT_LANGUAGES)
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // Temp directories are removed when `dir` drops
        }
    }
}

fn list_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
