use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// State of a synthesis job. Jobs only ever move forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    Idle,
    Preparing,
    ProcessingReference,
    Synthesizing,
    Finalizing,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Succeeded | JobPhase::Failed)
    }

    /// Progress to show for this phase, in percent
    pub fn progress(&self) -> u8 {
        match self {
            JobPhase::Idle => 0,
            JobPhase::Preparing => 20,
            JobPhase::ProcessingReference => 40,
            JobPhase::Synthesizing => 60,
            JobPhase::Finalizing => 90,
            JobPhase::Succeeded | JobPhase::Failed => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JobPhase::Idle => "Waiting",
            JobPhase::Preparing => "Preparing the model",
            JobPhase::ProcessingReference => "Processing the voice sample",
            JobPhase::Synthesizing => "Generating audio",
            JobPhase::Finalizing => "Finalizing",
            JobPhase::Succeeded => "Audio generated",
            JobPhase::Failed => "Generation failed",
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobPhase::Idle => "idle",
            JobPhase::Preparing => "preparing",
            JobPhase::ProcessingReference => "processing_reference",
            JobPhase::Synthesizing => "synthesizing",
            JobPhase::Finalizing => "finalizing",
            JobPhase::Succeeded => "succeeded",
            JobPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Receives every phase transition of a job.
///
/// Called inline from the job, so implementations must not block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, job_id: Uuid, phase: JobPhase);
}

/// Discards progress
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _job_id: Uuid, _phase: JobPhase) {}
}

/// Logs each transition
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, job_id: Uuid, phase: JobPhase) {
        tracing::info!(
            job_id = %job_id,
            phase = %phase,
            progress = phase.progress(),
            "{}",
            phase.message()
        );
    }
}

/// Forwards transitions to an async consumer (e.g. a server-sent event stream)
pub struct ChannelProgress {
    sender: UnboundedSender<JobPhase>,
}

impl ChannelProgress {
    pub fn new(sender: UnboundedSender<JobPhase>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, _job_id: Uuid, phase: JobPhase) {
        // Receiver gone means the client disconnected; the job carries on
        let _ = self.sender.send(phase);
    }
}
