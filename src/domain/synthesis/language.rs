use lingua::{Language, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// Languages XTTS v2 was trained on, as ISO 639-1 codes (plus `zh-cn`)
pub const XTTS_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "pl", "tr", "ru", "nl", "cs", "ar", "zh-cn", "ja", "hu",
    "ko", "hi",
];

/// Language code passed through to the model.
///
/// The job does not decide which codes the model understands: an unknown
/// code travels to the model and comes back as a model failure. The HTTP
/// layer narrows input to the configured set before a job is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_lowercase())
    }

    /// Get the language code as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human readable name for the codes XTTS knows about
    pub fn display_name(&self) -> &'static str {
        match self.0.as_str() {
            "en" => "English",
            "es" => "Español",
            "fr" => "Français",
            "de" => "Deutsch",
            "it" => "Italiano",
            "pt" => "Português",
            "pl" => "Polski",
            "tr" => "Türkçe",
            "ru" => "Русский",
            "nl" => "Nederlands",
            "cs" => "Čeština",
            "ar" => "العربية",
            "zh-cn" => "中文",
            "ja" => "日本語",
            "hu" => "Magyar",
            "ko" => "한국어",
            "hi" => "हिन्दी",
            _ => "Unknown",
        }
    }

    pub fn is_known_to_xtts(&self) -> bool {
        XTTS_LANGUAGES.contains(&self.0.as_str())
    }

    /// Convert to the lingua language, for the codes the detector is built with
    fn to_lingua(&self) -> Option<Language> {
        match self.0.as_str() {
            "en" => Some(Language::English),
            "es" => Some(Language::Spanish),
            "fr" => Some(Language::French),
            "de" => Some(Language::German),
            "it" => Some(Language::Italian),
            "pt" => Some(Language::Portuguese),
            _ => None,
        }
    }

    fn from_lingua(language: Language) -> Self {
        let code = match language {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
            Language::Portuguese => "pt",
        };
        Self(code.to_string())
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Detect the language of the given text among `candidates`.
///
/// Only candidates the detector can recognise take part. Returns the first
/// candidate when detection is impossible or inconclusive.
pub fn detect_language(text: &str, candidates: &[LanguageCode]) -> Option<LanguageCode> {
    let fallback = candidates.first().cloned();

    let languages: Vec<Language> = candidates.iter().filter_map(|c| c.to_lingua()).collect();
    if languages.len() < 2 {
        // lingua needs at least two languages to choose between
        return languages
            .first()
            .map(|l| LanguageCode::from_lingua(*l))
            .or(fallback);
    }

    let detector = LanguageDetectorBuilder::from_languages(&languages).build();

    match detector.detect_language_of(text) {
        Some(language) => Some(LanguageCode::from_lingua(language)),
        None => {
            tracing::warn!(fallback = ?fallback, "Could not detect language, using fallback");
            fallback
        }
    }
}
