use crate::domain::synthesis::LanguageCode;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Failure raised inside the model. The reason is passed through untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{reason}")]
pub struct ModelError {
    pub reason: String,
}

impl ModelError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Compute device the model runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Cpu,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Cpu => "cpu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Device::Cuda => "GPU",
            Device::Cpu => "CPU",
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Arguments of one synthesis call
#[derive(Debug, Clone, Copy)]
pub struct SynthesisCall<'a> {
    pub text: &'a str,
    pub language: &'a LanguageCode,
    /// Reference voice sample; `None` selects the model's default speaker
    pub speaker_wav: Option<&'a Path>,
    pub speed: f32,
    /// Where the model should write the audio
    pub output_path: &'a Path,
}

/// Port to the text-to-speech engine.
/// Abstracts the model that actually produces audio (XTTS v2, a test fake, ...)
///
/// Implementations are responsible for:
/// - Loading the model before the first call (construction may be slow)
/// - Writing a playable WAV file for each successful call
/// - Reporting every failure as a [`ModelError`], never panicking
///
/// The caller does not retry: one failed call ends the job.
#[async_trait]
pub trait AudioModelPort: Send + Sync {
    /// Synthesize `call.text` and return the path of the written audio file
    ///
    /// # Errors
    /// Returns error on unsupported language, unreadable reference audio,
    /// out-of-memory, or when the engine is unavailable
    async fn synthesize(&self, call: SynthesisCall<'_>) -> Result<PathBuf, ModelError>;

    /// Device the model was loaded on
    fn device(&self) -> Device;

    /// Model identifier, for diagnostics
    fn name(&self) -> &str;

    /// Whether the engine can still take calls
    fn is_available(&self) -> bool {
        true
    }
}
