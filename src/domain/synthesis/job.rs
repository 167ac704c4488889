use super::error::{JobError, JobFailure};
use super::language::LanguageCode;
use super::phase::{JobPhase, ProgressSink};
use super::request::SynthesisRequest;
use crate::infrastructure::engines::{AudioModelPort, Device, ModelError, SynthesisCall};
use crate::infrastructure::storage::{AssetGuard, OutputNamer, TemporaryAudioStore};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Speaking rate used to estimate audio length at speed 1.0
const CHARACTERS_PER_MINUTE: f32 = 1000.0;

/// Outcome of a successful job
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub job_id: Uuid,
    pub output_path: PathBuf,
    pub language: LanguageCode,
    pub device: Device,
    pub speed: f32,
    pub cloned_voice: bool,
    /// Wall-clock time spent in the job
    pub elapsed: Duration,
    pub estimated_duration_seconds: f32,
    pub character_count: usize,
    pub word_count: usize,
}

impl SynthesisResult {
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Collaborators a job runs against. Owned by the host, borrowed per job.
#[derive(Clone, Copy)]
pub struct JobDependencies<'a> {
    pub model: &'a dyn AudioModelPort,
    pub store: &'a dyn TemporaryAudioStore,
    pub outputs: &'a OutputNamer,
    pub progress: &'a dyn ProgressSink,
}

/// One text-to-audio request and its lifecycle:
///
/// `Idle → Preparing → (ProcessingReference)? → Synthesizing → Finalizing → Succeeded | Failed`
///
/// Any reference audio written to the temporary store is released before
/// [`SynthesisJob::run`] returns, whatever the outcome.
#[derive(Debug)]
pub struct SynthesisJob {
    id: Uuid,
    request: SynthesisRequest,
    phase: JobPhase,
    output_path: Option<PathBuf>,
    error: Option<JobFailure>,
}

impl SynthesisJob {
    pub fn new(request: SynthesisRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            phase: JobPhase::Idle,
            output_path: None,
            error: None,
        }
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    pub fn error(&self) -> Option<&JobFailure> {
        self.error.as_ref()
    }

    /// Drive the job to a terminal phase. Never panics on model or storage
    /// failures: they come back as `Err` and the job ends in `Failed`.
    pub async fn run(&mut self, deps: JobDependencies<'_>) -> Result<SynthesisResult, JobError> {
        if self.phase.is_terminal() {
            tracing::warn!(job_id = %self.id, phase = %self.phase, "Job already finished");
        }

        let start_time = Instant::now();
        let outcome = self.execute(deps, start_time).await;

        match &outcome {
            Ok(result) => {
                self.output_path = Some(result.output_path.clone());
                self.transition(deps.progress, JobPhase::Succeeded);
                tracing::info!(
                    job_id = %self.id,
                    output_path = %result.output_path.display(),
                    language = %result.language,
                    device = %result.device,
                    elapsed_ms = result.elapsed.as_millis(),
                    "Synthesis job succeeded"
                );
            }
            Err(e) => {
                self.error = Some(JobFailure::from(e));
                self.transition(deps.progress, JobPhase::Failed);
                tracing::error!(
                    job_id = %self.id,
                    error_kind = %e.kind(),
                    error = %e,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    "Synthesis job failed"
                );
            }
        }

        outcome
    }

    async fn execute(
        &mut self,
        deps: JobDependencies<'_>,
        start_time: Instant,
    ) -> Result<SynthesisResult, JobError> {
        // 1. Validate before touching any resource
        self.request.validate()?;

        // 2. Prepare
        self.transition(deps.progress, JobPhase::Preparing);

        // 3. Write the reference sample, if any. The guard releases it on
        //    every path out of this function, including a dropped future.
        let mut reference = AssetGuard::new(deps.store);
        if self.request.reference_audio.is_some() {
            self.transition(deps.progress, JobPhase::ProcessingReference);
            if let Some(audio) = &self.request.reference_audio {
                let asset = deps
                    .store
                    .acquire(audio.bytes(), audio.container().extension())
                    .await?;
                reference.hold(asset);
            }
        }

        // 4. The single call into the model
        self.transition(deps.progress, JobPhase::Synthesizing);
        let output_path = deps.outputs.next_path();
        let produced = deps
            .model
            .synthesize(SynthesisCall {
                text: &self.request.text,
                language: &self.request.language,
                speaker_wav: reference.path(),
                speed: self.request.speed.value(),
                output_path: &output_path,
            })
            .await?;

        // 5. Finalize
        self.transition(deps.progress, JobPhase::Finalizing);
        reference.release();

        match tokio::fs::metadata(&produced).await {
            Ok(meta) if meta.is_file() => {}
            _ => {
                return Err(ModelError::new(format!(
                    "model reported success but no audio was written to {}",
                    produced.display()
                ))
                .into())
            }
        }

        let character_count = self.request.character_count();
        let speed = self.request.speed.value();

        Ok(SynthesisResult {
            job_id: self.id,
            output_path: produced,
            language: self.request.language.clone(),
            device: deps.model.device(),
            speed,
            cloned_voice: self.request.reference_audio.is_some(),
            elapsed: start_time.elapsed(),
            estimated_duration_seconds: character_count as f32 / CHARACTERS_PER_MINUTE * 60.0
                / speed,
            character_count,
            word_count: self.request.word_count(),
        })
    }

    fn transition(&mut self, progress: &dyn ProgressSink, next: JobPhase) {
        tracing::debug!(job_id = %self.id, from = %self.phase, to = %next, "Job phase transition");
        self.phase = next;
        progress.report(self.id, next);
    }
}
