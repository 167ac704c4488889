use crate::e2e::helpers;

use helpers::api_client::audio_part;
use helpers::{TestContext, EMPTY_WAV, MAX_REFERENCE_AUDIO_BYTES, MAX_TEXT_CHARS};
use reqwest::multipart::Form;
use reqwest::StatusCode;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use test_context::test_context;
use voice_maker::domain::synthesis::dto::SynthesisResponse;
use voice_maker::infrastructure::storage::is_output_name;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_french_text(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Bonjour")
        .text("language", "fr");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body: SynthesisResponse = response.json().unwrap();
    assert!(is_output_name(&body.file_name), "unexpected name {}", body.file_name);
    assert_eq!(body.audio_url, format!("/api/audio/{}", body.file_name));
    assert_eq!(body.language, "fr");
    assert_eq!(body.device, "cpu");
    assert_eq!(body.speed, 1.0);
    assert!(!body.cloned_voice);
    assert_eq!(body.character_count, 7);
    assert_eq!(body.word_count, 1);
    assert!(ctx.output_dir().join(&body.file_name).is_file());

    let calls = ctx.model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, "Bonjour");
    assert_eq!(calls[0].language, "fr");
    assert!(calls[0].speaker_wav.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_empty_text(ctx: &TestContext) {
    for text in ["", "   \n\t "] {
        let form = Form::new().text("text", text).text("language", "fr");

        let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_kind("validation_error")
            .assert_error_message("Text cannot be empty");
    }

    assert!(ctx.model.calls().is_empty());
    assert!(ctx.output_files().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_languages_that_are_not_offered(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Hello")
        .text("language", "xx");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Unsupported language: xx");
    assert!(ctx.model.calls().is_empty());
}

#[tokio::test]
async fn it_should_pass_model_errors_through() {
    // Offer a language XTTS does not know so the request reaches the model
    let ctx = TestContext::start("fr,xx").await;
    let form = Form::new()
        .text("text", "Hello")
        .text("language", "xx")
        .part("reference_audio", audio_part("voice.wav", "audio/wav", EMPTY_WAV));

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

    response
        .assert_status(StatusCode::BAD_GATEWAY)
        .assert_error_kind("model_error")
        .assert_error_message("Language xx is not supported.");

    // The reference sample was written for the call and removed afterwards
    let calls = ctx.model.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].speaker_bytes.as_deref(), Some(EMPTY_WAV));
    assert!(ctx.temp_files().is_empty());
    assert!(ctx.output_files().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clone_a_voice_from_reference_audio(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Hello world")
        .text("language", "en")
        .part("reference_audio", audio_part("voice.wav", "audio/wav", EMPTY_WAV));

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body: SynthesisResponse = response.json().unwrap();
    assert!(body.cloned_voice);

    let calls = ctx.model.calls();
    let speaker_wav = calls[0].speaker_wav.clone().expect("speaker_wav forwarded");
    assert_eq!(speaker_wav.extension().and_then(|e| e.to_str()), Some("wav"));
    assert_eq!(calls[0].speaker_bytes.as_deref(), Some(EMPTY_WAV));

    // Released once the job is over
    assert!(!speaker_wav.exists());
    assert!(ctx.temp_files().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_detect_mp3_from_the_file_name_when_mime_is_generic(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Hola")
        .text("language", "es")
        .part(
            "reference_audio",
            audio_part("sample.MP3", "application/octet-stream", b"ID3\x03\x00\x00\x00"),
        );

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let calls = ctx.model.calls();
    let speaker_wav = calls[0].speaker_wav.clone().unwrap();
    assert_eq!(speaker_wav.extension().and_then(|e| e.to_str()), Some("mp3"));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_unsupported_reference_formats(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Hello")
        .text("language", "en")
        .part("reference_audio", audio_part("notes.txt", "text/plain", b"not audio"));

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

    response
        .assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE)
        .assert_error_kind("validation_error");
    assert!(ctx.model.calls().is_empty());
    assert!(ctx.temp_files().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_ignore_an_empty_file_part(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Bonjour")
        .part("reference_audio", audio_part("", "application/octet-stream", b""));

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body: SynthesisResponse = response.json().unwrap();
    assert!(!body.cloned_voice);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_oversized_reference_audio(ctx: &TestContext) {
    let audio = vec![0u8; MAX_REFERENCE_AUDIO_BYTES + 1];
    let form = Form::new()
        .text("text", "Hello")
        .text("language", "en")
        .part("reference_audio", audio_part("voice.wav", "audio/wav", &audio));

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    assert!(ctx.model.calls().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_text_over_the_character_limit(ctx: &TestContext) {
    let text = "a".repeat(MAX_TEXT_CHARS + 1);
    let form = Form::new().text("text", text).text("language", "en");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

    response
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE)
        .assert_error_message("characters or less");
    assert!(ctx.model.calls().is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clamp_speed_into_range(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Guten Tag")
        .text("language", "de")
        .text("speed", "3.0");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body: SynthesisResponse = response.json().unwrap();
    assert_eq!(body.speed, 1.5);
    assert_eq!(ctx.model.calls()[0].speed, 1.5);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_a_non_numeric_speed(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Guten Tag")
        .text("language", "de")
        .text("speed", "fast");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_message("Speed must be a number");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_default_to_the_first_offered_language(ctx: &TestContext) {
    let form = Form::new().text("text", "Bonjour tout le monde");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body: SynthesisResponse = response.json().unwrap();
    assert_eq!(body.language, ctx.languages[0].as_str());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_detect_the_language_when_asked(ctx: &TestContext) {
    let form = Form::new()
        .text(
            "text",
            "Questo è un test in italiano. La volpe marrone veloce salta sopra il cane pigro.",
        )
        .text("language", "auto");

    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    response.assert_status(StatusCode::OK);

    let body: SynthesisResponse = response.json().unwrap();
    assert_eq!(body.language, "it");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_give_concurrent_jobs_distinct_outputs(ctx: &TestContext) {
    let mut futures = Vec::new();
    for i in 0..8 {
        let client = ctx.client.clone();
        futures.push(async move {
            let form = Form::new()
                .text("text", format!("Phrase numéro {}", i))
                .text("language", "fr")
                .part("reference_audio", audio_part("voice.wav", "audio/wav", EMPTY_WAV));
            client.post_form("/api/synthesize", form).await
        });
    }

    let results = futures::future::join_all(futures).await;

    let mut names = HashSet::new();
    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
        let body: SynthesisResponse = response.json().unwrap();
        names.insert(body.file_name);
    }

    assert_eq!(names.len(), 8);
    assert_eq!(ctx.output_files().len(), 8);
    assert!(ctx.temp_files().is_empty());
}
