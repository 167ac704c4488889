use crate::domain::synthesis::LanguageCode;
use crate::infrastructure::engines::xtts_worker::{DEFAULT_MODEL_NAME, DEFAULT_SPEAKER};
use crate::infrastructure::engines::{DevicePreference, XttsWorkerConfig};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // XTTS worker
    pub xtts_python: String,
    pub xtts_worker_script: PathBuf,
    pub xtts_model_name: String,
    pub xtts_device: DevicePreference,
    /// Built-in voice for requests without reference audio
    pub xtts_default_speaker: String,
    // Synthesis
    pub supported_languages: Vec<LanguageCode>,
    pub temp_audio_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_text_chars: usize,
    pub max_reference_audio_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let supported_languages =
            parse_languages(&env::var("SUPPORTED_LANGUAGES").unwrap_or_else(|_| "fr,en,es,de,it".to_string()));
        if supported_languages.is_empty() {
            return Err("SUPPORTED_LANGUAGES must list at least one language".into());
        }

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "production" => Environment::Production,
                    _ => Environment::Development,
                })?,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse::<String>()
                .map(|s| match s.as_str() {
                    "json" => LogFormat::Json,
                    _ => LogFormat::Pretty,
                })?,
            xtts_python: env::var("XTTS_PYTHON").unwrap_or_else(|_| "python3".to_string()),
            xtts_worker_script: env::var("XTTS_WORKER_SCRIPT")
                .unwrap_or_else(|_| "scripts/xtts_worker.py".to_string())
                .into(),
            xtts_model_name: env::var("XTTS_MODEL_NAME")
                .unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string()),
            xtts_device: match env::var("XTTS_DEVICE")
                .unwrap_or_else(|_| "auto".to_string())
                .to_lowercase()
                .as_str()
            {
                "cuda" => DevicePreference::Cuda,
                "cpu" => DevicePreference::Cpu,
                _ => DevicePreference::Auto,
            },
            xtts_default_speaker: env::var("XTTS_DEFAULT_SPEAKER")
                .unwrap_or_else(|_| DEFAULT_SPEAKER.to_string()),
            supported_languages,
            temp_audio_dir: env::var("TEMP_AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| env::temp_dir().join("voice-maker")),
            output_dir: env::var("OUTPUT_DIR")
                .unwrap_or_else(|_| "output".to_string())
                .into(),
            max_text_chars: env::var("MAX_TEXT_CHARS")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()?,
            max_reference_audio_bytes: env::var("MAX_REFERENCE_AUDIO_BYTES")
                .unwrap_or_else(|_| (20 * 1024 * 1024).to_string())
                .parse()?,
        };

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// How to launch the XTTS worker process
    pub fn xtts_worker(&self) -> XttsWorkerConfig {
        XttsWorkerConfig::python(
            self.xtts_python.clone(),
            &self.xtts_worker_script,
            self.xtts_model_name.clone(),
            self.xtts_device,
            self.xtts_default_speaker.clone(),
        )
    }
}

/// Parse a comma separated language list, dropping blanks and duplicates
pub fn parse_languages(raw: &str) -> Vec<LanguageCode> {
    let mut languages: Vec<LanguageCode> = Vec::new();
    for code in raw.split(',').map(LanguageCode::new) {
        if !code.as_str().is_empty() && !languages.contains(&code) {
            languages.push(code);
        }
    }
    languages
}
