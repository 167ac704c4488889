use super::error::JobError;
use super::job::{JobDependencies, SynthesisJob, SynthesisResult};
use super::language::{detect_language, LanguageCode};
use super::phase::ProgressSink;
use super::request::{ReferenceAudio, SynthesisRequest};
use crate::infrastructure::engines::{AudioModelPort, Device};
use crate::infrastructure::storage::{OutputNamer, TemporaryAudioStore};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// Language value that asks the service to detect the language from the text
pub const AUTO_LANGUAGE: &str = "auto";

pub struct SynthesisService {
    model: Arc<dyn AudioModelPort>,
    store: Arc<dyn TemporaryAudioStore>,
    outputs: Arc<OutputNamer>,
    languages: Vec<LanguageCode>,
}

impl SynthesisService {
    pub fn new(
        model: Arc<dyn AudioModelPort>,
        store: Arc<dyn TemporaryAudioStore>,
        outputs: Arc<OutputNamer>,
        languages: Vec<LanguageCode>,
    ) -> Self {
        Self {
            model,
            store,
            outputs,
            languages,
        }
    }

    /// Languages offered to users, in display order
    pub fn languages(&self) -> &[LanguageCode] {
        &self.languages
    }

    pub fn default_language(&self) -> Option<&LanguageCode> {
        self.languages.first()
    }

    pub fn is_offered(&self, language: &LanguageCode) -> bool {
        language.as_str() == AUTO_LANGUAGE || self.languages.contains(language)
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn device(&self) -> Device {
        self.model.device()
    }

    pub fn model_available(&self) -> bool {
        self.model.is_available()
    }

    /// Path of a previously produced audio file, if `file_name` is one of ours
    pub fn output_file(&self, file_name: &str) -> Option<PathBuf> {
        self.outputs.resolve(file_name)
    }
}

#[async_trait]
pub trait SynthesisServiceApi: Send + Sync {
    /// Turn text into an audio file.
    ///
    /// This operation:
    /// - Resolves `auto` to a detected language
    /// - Runs one synthesis job against the injected model
    /// - Reports every phase to `progress`
    ///
    /// Returns the produced file with its metadata, or the job failure
    async fn synthesize_request(
        &self,
        text: &str,
        language: &str,
        reference_audio: Option<ReferenceAudio>,
        speed: f32,
        progress: &dyn ProgressSink,
    ) -> Result<SynthesisResult, JobError>;
}

#[async_trait]
impl SynthesisServiceApi for SynthesisService {
    async fn synthesize_request(
        &self,
        text: &str,
        language: &str,
        reference_audio: Option<ReferenceAudio>,
        speed: f32,
        progress: &dyn ProgressSink,
    ) -> Result<SynthesisResult, JobError> {
        // 1. Clean the text (normalize whitespace)
        let cleaned_text = clean_text(text);

        // 2. Resolve the language
        let language = self.resolve_language(&cleaned_text, language);

        tracing::info!(
            language = %language,
            text_length = cleaned_text.len(),
            reference_audio_bytes = reference_audio.as_ref().map_or(0, |r| r.len()),
            speed = speed,
            "Synthesis request"
        );

        // 3. Build and run the job
        let mut request = SynthesisRequest::new(cleaned_text, language).with_speed(speed);
        if let Some(reference_audio) = reference_audio {
            request = request.with_reference_audio(reference_audio);
        }

        let mut job = SynthesisJob::new(request);
        job.run(JobDependencies {
            model: self.model.as_ref(),
            store: self.store.as_ref(),
            outputs: self.outputs.as_ref(),
            progress,
        })
        .await
    }
}

impl SynthesisService {
    fn resolve_language(&self, text: &str, language: &str) -> LanguageCode {
        let requested = LanguageCode::new(language);
        if requested.as_str() != AUTO_LANGUAGE {
            return requested;
        }

        match detect_language(text, &self.languages) {
            Some(detected) => {
                tracing::info!(language_detected = %detected, "Language detected for synthesis");
                detected
            }
            None => requested,
        }
    }
}

/// Collapse runs of whitespace (newlines, tabs) into single spaces
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
