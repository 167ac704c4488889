use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{
    domain::synthesis::{
        dto::{LanguageOption, LanguagesResponse, PhaseEvent, SynthesisResponse},
        AudioContainer, ChannelProgress, LanguageCode, ReferenceAudio, SynthesisService,
        SynthesisServiceApi, TracingProgress, DEFAULT_SPEED,
    },
    error::{AppError, AppResult},
};

/// Multipart form accepted by the synthesis endpoints
#[derive(Debug)]
pub struct SynthesisForm {
    pub text: String,
    pub language: LanguageCode,
    pub speed: f32,
    pub reference_audio: Option<ReferenceAudio>,
}

pub struct SynthesisController {
    synthesis_service: Arc<SynthesisService>,
    max_text_chars: usize,
    max_reference_audio_bytes: usize,
}

impl SynthesisController {
    pub fn new(
        synthesis_service: Arc<SynthesisService>,
        max_text_chars: usize,
        max_reference_audio_bytes: usize,
    ) -> Self {
        Self {
            synthesis_service,
            max_text_chars,
            max_reference_audio_bytes,
        }
    }

    /// Largest request body the synthesis routes accept
    pub fn body_limit(&self) -> usize {
        self.max_reference_audio_bytes + self.max_text_chars * 4 + 64 * 1024
    }

    /// POST /api/synthesize - Run a job and return the produced audio's metadata
    pub async fn synthesize(
        State(controller): State<Arc<SynthesisController>>,
        multipart: Multipart,
    ) -> AppResult<Json<SynthesisResponse>> {
        let form = controller.read_form(multipart).await?;

        let result = controller
            .synthesis_service
            .synthesize_request(
                &form.text,
                form.language.as_str(),
                form.reference_audio,
                form.speed,
                &TracingProgress,
            )
            .await?;

        Ok(Json(SynthesisResponse::from(&result)))
    }

    /// POST /api/synthesize/stream - Same as `synthesize`, reporting each phase
    /// as a server-sent event before the final `result` or `error` event
    pub async fn synthesize_stream(
        State(controller): State<Arc<SynthesisController>>,
        multipart: Multipart,
    ) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
        let form = controller.read_form(multipart).await?;

        let (phase_tx, phase_rx) = mpsc::unbounded_channel();
        let service = controller.synthesis_service.clone();

        // The job outlives a disconnected client; its cleanup still runs
        let job = tokio::spawn(async move {
            let progress = ChannelProgress::new(phase_tx);
            service
                .synthesize_request(
                    &form.text,
                    form.language.as_str(),
                    form.reference_audio,
                    form.speed,
                    &progress,
                )
                .await
        });

        let phases = UnboundedReceiverStream::new(phase_rx)
            .map(|phase| json_event("phase", &PhaseEvent::from(phase)));

        let outcome = stream::once(async move {
            match job.await {
                Ok(Ok(result)) => json_event("result", &SynthesisResponse::from(&result)),
                Ok(Err(e)) => json_event("error", &AppError::from(e).to_response()),
                Err(e) => {
                    tracing::error!(error = %e, "Synthesis task aborted");
                    json_event(
                        "error",
                        &AppError::Internal("synthesis task aborted".to_string()).to_response(),
                    )
                }
            }
        });

        let events = phases.chain(outcome).map(Ok::<_, Infallible>);
        Ok(Sse::new(events).keep_alive(KeepAlive::default()))
    }

    /// GET /api/languages - Languages offered in the form
    pub async fn languages(
        State(controller): State<Arc<SynthesisController>>,
    ) -> Json<LanguagesResponse> {
        let service = &controller.synthesis_service;
        Json(LanguagesResponse {
            languages: service
                .languages()
                .iter()
                .map(|l| LanguageOption {
                    code: l.to_string(),
                    name: l.display_name().to_string(),
                })
                .collect(),
            default: service.default_language().map(|l| l.to_string()),
        })
    }

    async fn read_form(&self, mut multipart: Multipart) -> AppResult<SynthesisForm> {
        let mut text = String::new();
        let mut language: Option<LanguageCode> = None;
        let mut speed = DEFAULT_SPEED;
        let mut reference_audio = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error("Failed to parse multipart form", e))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            match field_name.as_str() {
                "text" => {
                    text = field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read text", e))?;
                }
                "language" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read language", e))?;
                    if !value.trim().is_empty() {
                        language = Some(LanguageCode::new(value));
                    }
                }
                "speed" => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read speed", e))?;
                    if !value.trim().is_empty() {
                        speed = value.trim().parse().map_err(|_| {
                            AppError::BadRequest(format!("Speed must be a number, got '{}'", value))
                        })?;
                    }
                }
                "reference_audio" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error("Failed to read reference audio", e))?;

                    // Browsers send an empty part when no file was picked
                    if bytes.is_empty() {
                        continue;
                    }

                    if bytes.len() > self.max_reference_audio_bytes {
                        return Err(AppError::PayloadTooLarge(format!(
                            "Reference audio must be {} bytes or less",
                            self.max_reference_audio_bytes
                        )));
                    }

                    let container =
                        AudioContainer::detect(content_type.as_deref(), file_name.as_deref())
                            .ok_or_else(|| {
                                AppError::UnsupportedMediaType(format!(
                                    "Reference audio must be WAV or MP3, got '{}'",
                                    content_type.as_deref().unwrap_or("unknown")
                                ))
                            })?;

                    reference_audio = Some(ReferenceAudio::new(bytes.to_vec(), container));
                }
                other => {
                    tracing::debug!(field = other, "Ignoring unknown form field");
                }
            }
        }

        if text.chars().count() > self.max_text_chars {
            return Err(AppError::PayloadTooLarge(format!(
                "Text must be {} characters or less",
                self.max_text_chars
            )));
        }

        let language = match language {
            Some(language) => language,
            None => self
                .synthesis_service
                .default_language()
                .cloned()
                .ok_or_else(|| AppError::Internal("no language configured".to_string()))?,
        };

        if !self.synthesis_service.is_offered(&language) {
            return Err(AppError::BadRequest(format!(
                "Unsupported language: {}",
                language
            )));
        }

        Ok(SynthesisForm {
            text,
            language,
            speed,
            reference_audio,
        })
    }
}

fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{}: {}", context, err))
    } else {
        AppError::BadRequest(format!("{}: {}", context, err))
    }
}

fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}
