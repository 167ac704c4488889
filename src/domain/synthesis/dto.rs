use super::job::SynthesisResult;
use super::phase::JobPhase;
use serde::{Deserialize, Serialize};

/// Response for POST /api/synthesize and the final `result` stream event
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesisResponse {
    pub job_id: String,
    pub audio_url: String,
    pub file_name: String,
    pub language: String,
    pub device: String,
    pub speed: f32,
    pub cloned_voice: bool,
    pub elapsed_ms: u64,
    pub estimated_duration_seconds: f32,
    pub character_count: usize,
    pub word_count: usize,
}

impl From<&SynthesisResult> for SynthesisResponse {
    fn from(result: &SynthesisResult) -> Self {
        let file_name = result.file_name();
        Self {
            job_id: result.job_id.to_string(),
            audio_url: format!("/api/audio/{}", file_name),
            file_name,
            language: result.language.to_string(),
            device: result.device.to_string(),
            speed: result.speed,
            cloned_voice: result.cloned_voice,
            elapsed_ms: result.elapsed.as_millis() as u64,
            estimated_duration_seconds: result.estimated_duration_seconds,
            character_count: result.character_count,
            word_count: result.word_count,
        }
    }
}

/// `phase` stream event
#[derive(Debug, Serialize)]
pub struct PhaseEvent {
    pub phase: JobPhase,
    pub progress: u8,
    pub message: &'static str,
}

impl From<JobPhase> for PhaseEvent {
    fn from(phase: JobPhase) -> Self {
        Self {
            phase,
            progress: phase.progress(),
            message: phase.message(),
        }
    }
}

/// Entry of GET /api/languages
#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageOption {
    pub code: String,
    pub name: String,
}

/// Response for GET /api/languages
#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagesResponse {
    pub languages: Vec<LanguageOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}
