use super::audio_model::{AudioModelPort, Device, ModelError, SynthesisCall};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

pub const DEFAULT_MODEL_NAME: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

/// Built-in XTTS voice used when a request has no reference audio
pub const DEFAULT_SPEAKER: &str = "Ana Florence";

/// Loading XTTS v2 takes tens of seconds on first run (download + weights)
const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn worker `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("worker exited before the model was loaded")]
    ExitedBeforeReady,
    #[error("worker did not become ready within {0:?}")]
    ReadyTimeout(Duration),
    #[error("worker I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Device requested from the worker. `Auto` picks CUDA when available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    Auto,
    Cuda,
    Cpu,
}

impl DevicePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            DevicePreference::Auto => "auto",
            DevicePreference::Cuda => "cuda",
            DevicePreference::Cpu => "cpu",
        }
    }
}

#[derive(Debug, Clone)]
pub struct XttsWorkerConfig {
    pub program: String,
    pub args: Vec<String>,
    pub model_name: String,
    pub default_speaker: String,
    pub ready_timeout: Duration,
}

impl XttsWorkerConfig {
    /// Run the bundled Python worker script with the given interpreter
    pub fn python(
        python: impl Into<String>,
        script: &Path,
        model_name: impl Into<String>,
        device: DevicePreference,
        default_speaker: impl Into<String>,
    ) -> Self {
        let model_name = model_name.into();
        let default_speaker = default_speaker.into();
        Self {
            program: python.into(),
            args: vec![
                "-u".to_string(),
                script.display().to_string(),
                "--model".to_string(),
                model_name.clone(),
                "--device".to_string(),
                device.as_str().to_string(),
                "--default-speaker".to_string(),
                default_speaker.clone(),
            ],
            model_name,
            default_speaker,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

/// One JSON line sent to the worker
#[derive(Debug, Serialize)]
struct WorkerRequest<'a> {
    id: u64,
    text: &'a str,
    language: &'a str,
    speaker_wav: Option<&'a Path>,
    /// Built-in voice, sent only when there is no `speaker_wav`
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker: Option<&'a str>,
    speed: f32,
    out_path: &'a Path,
}

/// One JSON line received from the worker
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkerMessage {
    Ready {
        #[allow(dead_code)]
        event: String,
        device: Device,
    },
    Response {
        id: u64,
        ok: bool,
        #[serde(default)]
        out_path: Option<PathBuf>,
        #[serde(default)]
        error: Option<String>,
    },
}

struct WorkerPipes {
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
}

/// XTTS v2 hosted in a long-lived Python process.
///
/// The model is loaded once by [`XttsWorker::spawn`] and reused for every
/// job. Requests go over stdin/stdout as JSON lines, one at a time.
/// The process is killed when the worker is dropped.
pub struct XttsWorker {
    model_name: String,
    default_speaker: String,
    device: Device,
    pipes: Mutex<WorkerPipes>,
    child: parking_lot::Mutex<Child>,
    alive: AtomicBool,
}

impl XttsWorker {
    /// Start the worker and wait until it reports the model as loaded.
    ///
    /// This is the expensive step of the whole service: it blocks until the
    /// weights are on the device, which can take minutes on a cold cache.
    pub async fn spawn(config: XttsWorkerConfig) -> Result<Self, WorkerError> {
        let start_time = Instant::now();

        tracing::info!(
            program = %config.program,
            model = %config.model_name,
            "Starting XTTS worker"
        );

        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                program: config.program.clone(),
                source,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(WorkerError::Io(std::io::Error::other(
                "worker pipes were not captured",
            )));
        };
        let mut stdout = BufReader::new(stdout).lines();

        let device = tokio::time::timeout(config.ready_timeout, wait_ready(&mut stdout))
            .await
            .map_err(|_| WorkerError::ReadyTimeout(config.ready_timeout))??;

        tracing::info!(
            model = %config.model_name,
            device = %device,
            startup_ms = start_time.elapsed().as_millis(),
            "XTTS worker ready"
        );

        Ok(Self {
            model_name: config.model_name,
            default_speaker: config.default_speaker,
            device,
            pipes: Mutex::new(WorkerPipes {
                stdin,
                stdout,
                next_id: 1,
            }),
            child: parking_lot::Mutex::new(child),
            alive: AtomicBool::new(true),
        })
    }

    fn mark_dead(&self, reason: &str) {
        if self.alive.swap(false, Ordering::SeqCst) {
            tracing::error!(reason = reason, "XTTS worker is no longer available");
        }
    }

    /// Remove audio produced for a caller that stopped waiting
    fn discard_stale_output(&self, stale_id: u64, out_path: Option<&Path>) {
        let Some(path) = out_path else { return };
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!(
                stale_id = stale_id,
                path = %path.display(),
                "Removed audio of an abandoned request"
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                stale_id = stale_id,
                path = %path.display(),
                error = %e,
                "Failed to remove audio of an abandoned request"
            ),
        }
    }
}

async fn wait_ready(stdout: &mut Lines<BufReader<ChildStdout>>) -> Result<Device, WorkerError> {
    while let Some(line) = stdout.next_line().await? {
        match serde_json::from_str::<WorkerMessage>(&line) {
            Ok(WorkerMessage::Ready { device, .. }) => return Ok(device),
            Ok(other) => tracing::warn!(message = ?other, "Unexpected worker message before ready"),
            Err(_) => tracing::debug!(line = %line, "Worker output"),
        }
    }
    Err(WorkerError::ExitedBeforeReady)
}

#[async_trait]
impl AudioModelPort for XttsWorker {
    async fn synthesize(&self, call: SynthesisCall<'_>) -> Result<PathBuf, ModelError> {
        let start_time = Instant::now();
        let mut pipes = self.pipes.lock().await;

        let id = pipes.next_id;
        pipes.next_id += 1;

        let request = WorkerRequest {
            id,
            text: call.text,
            language: call.language.as_str(),
            speaker_wav: call.speaker_wav,
            speaker: call
                .speaker_wav
                .is_none()
                .then_some(self.default_speaker.as_str()),
            speed: call.speed,
            out_path: call.output_path,
        };

        tracing::info!(
            request_id = id,
            language = %call.language,
            text_length = call.text.len(),
            cloned_voice = call.speaker_wav.is_some(),
            speed = call.speed,
            "Calling XTTS worker"
        );

        let mut line = serde_json::to_string(&request)
            .map_err(|e| ModelError::new(format!("failed to encode worker request: {}", e)))?;
        line.push('\n');

        let written = async {
            pipes.stdin.write_all(line.as_bytes()).await?;
            pipes.stdin.flush().await
        }
        .await;
        if let Err(e) = written {
            self.mark_dead("broken pipe");
            return Err(worker_gone(&e));
        }

        loop {
            let next = match pipes.stdout.next_line().await {
                Ok(next) => next,
                Err(e) => {
                    self.mark_dead("unreadable output");
                    return Err(worker_gone(&e));
                }
            };
            let Some(line) = next else {
                tracing::error!(request_id = id, "XTTS worker closed its output");
                self.mark_dead("closed output");
                return Err(ModelError::new("XTTS worker exited unexpectedly"));
            };

            match serde_json::from_str::<WorkerMessage>(&line) {
                Ok(WorkerMessage::Response {
                    id: response_id,
                    ok,
                    out_path,
                    error,
                }) if response_id == id => {
                    let latency = start_time.elapsed();
                    if ok {
                        tracing::info!(
                            request_id = id,
                            latency_ms = latency.as_millis(),
                            "XTTS synthesis completed"
                        );
                        return Ok(out_path.unwrap_or_else(|| call.output_path.to_path_buf()));
                    }

                    let reason = error.unwrap_or_else(|| "unknown model error".to_string());
                    tracing::error!(
                        request_id = id,
                        error = %reason,
                        latency_ms = latency.as_millis(),
                        "XTTS synthesis failed"
                    );
                    return Err(ModelError::new(reason));
                }
                // Answer to a request whose caller went away
                Ok(WorkerMessage::Response {
                    id: stale,
                    ok,
                    out_path,
                    ..
                }) => {
                    tracing::warn!(request_id = id, stale_id = stale, "Discarding stale worker response");
                    if ok {
                        self.discard_stale_output(stale, out_path.as_deref());
                    }
                }
                Ok(WorkerMessage::Ready { .. }) => {}
                Err(_) => tracing::debug!(line = %line, "Worker output"),
            }
        }
    }

    fn device(&self) -> Device {
        self.device
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    fn is_available(&self) -> bool {
        if !self.alive.load(Ordering::SeqCst) {
            return false;
        }

        let exited = !matches!(self.child.lock().try_wait(), Ok(None));
        if exited {
            self.mark_dead("process exited");
        }
        !exited
    }
}

fn worker_gone(err: &std::io::Error) -> ModelError {
    ModelError::new(format!("XTTS worker is unavailable: {}", err))
}
