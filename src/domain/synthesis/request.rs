use super::error::JobError;
use super::language::LanguageCode;

pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 1.5;
pub const DEFAULT_SPEED: f32 = 1.0;

/// Speech speed multiplier, always within [`MIN_SPEED`, `MAX_SPEED`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Speed(f32);

impl Speed {
    /// Clamp `value` into range. Non-finite values fall back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_finite() {
            Self(value.clamp(MIN_SPEED, MAX_SPEED))
        } else {
            Self(DEFAULT_SPEED)
        }
    }

    pub fn value(&self) -> f32 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(DEFAULT_SPEED)
    }
}

/// Audio containers accepted as reference voice samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioContainer {
    Wav,
    Mp3,
}

impl AudioContainer {
    /// Resolve from the declared MIME type, falling back to the file extension
    /// when the client sent a generic type
    pub fn detect(mime: Option<&str>, file_name: Option<&str>) -> Option<Self> {
        let from_mime = mime.and_then(Self::from_mime);
        if from_mime.is_some() {
            return from_mime;
        }

        let generic = mime.map_or(true, |m| {
            let m = m.trim().to_ascii_lowercase();
            m.is_empty() || m == "application/octet-stream"
        });
        if !generic {
            return None;
        }

        file_name
            .and_then(|name| name.rsplit_once('.'))
            .and_then(|(_, ext)| Self::from_extension(ext))
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => Some(AudioContainer::Wav),
            "audio/mpeg" | "audio/mp3" | "audio/mpeg3" | "audio/x-mpeg-3" => Some(AudioContainer::Mp3),
            _ => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioContainer::Wav),
            "mp3" => Some(AudioContainer::Mp3),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioContainer::Wav => "wav",
            AudioContainer::Mp3 => "mp3",
        }
    }
}

/// Uploaded speaker sample used to clone a voice
#[derive(Debug, Clone)]
pub struct ReferenceAudio {
    bytes: Vec<u8>,
    container: AudioContainer,
}

impl ReferenceAudio {
    pub fn new(bytes: Vec<u8>, container: AudioContainer) -> Self {
        Self { bytes, container }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn container(&self) -> AudioContainer {
        self.container
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything a job needs to produce one audio file
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: LanguageCode,
    pub reference_audio: Option<ReferenceAudio>,
    pub speed: Speed,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, language: impl Into<LanguageCode>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            reference_audio: None,
            speed: Speed::default(),
        }
    }

    pub fn with_reference_audio(mut self, reference_audio: ReferenceAudio) -> Self {
        self.reference_audio = Some(reference_audio);
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Speed::new(speed);
        self
    }

    /// Reject requests the model must never see
    pub fn validate(&self) -> Result<(), JobError> {
        if self.text.trim().is_empty() {
            return Err(JobError::Validation("Text cannot be empty".to_string()));
        }

        if let Some(reference) = &self.reference_audio {
            if reference.is_empty() {
                return Err(JobError::Validation("Reference audio is empty".to_string()));
            }
        }

        Ok(())
    }

    pub fn character_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
