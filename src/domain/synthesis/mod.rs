pub mod dto;
pub mod error;
pub mod job;
pub mod language;
pub mod phase;
pub mod request;
pub mod service;

pub use error::{ErrorKind, JobError, JobFailure};
pub use job::{JobDependencies, SynthesisJob, SynthesisResult};
pub use language::{detect_language, LanguageCode};
pub use phase::{ChannelProgress, JobPhase, NoopProgress, ProgressSink, TracingProgress};
pub use request::{AudioContainer, ReferenceAudio, Speed, SynthesisRequest, DEFAULT_SPEED};
pub use service::{SynthesisService, SynthesisServiceApi, AUTO_LANGUAGE};
