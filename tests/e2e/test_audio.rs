use crate::e2e::helpers;

use helpers::{TestContext, EMPTY_WAV};
use reqwest::multipart::Form;
use reqwest::StatusCode;
use test_context::test_context;
use voice_maker::domain::synthesis::dto::SynthesisResponse;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_download_produced_audio(ctx: &TestContext) {
    let form = Form::new()
        .text("text", "Bonjour")
        .text("language", "fr");
    let response = ctx.client.post_form("/api/synthesize", form).await.unwrap();
    let body: SynthesisResponse = response.json().unwrap();

    let download = ctx.client.get(&body.audio_url).await.unwrap();

    download
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/wav")
        .assert_header(
            "content-disposition",
            &format!("attachment; filename=\"{}\"", body.file_name),
        );
    assert_eq!(download.body_bytes, EMPTY_WAV);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_not_found_for_unknown_audio(ctx: &TestContext) {
    let response = ctx
        .client
        .get("/api/audio/voice_maker_20250101_120000_deadbeef.wav")
        .await
        .unwrap();

    response
        .assert_status(StatusCode::NOT_FOUND)
        .assert_error_kind("not_found");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_names_outside_the_output_directory(ctx: &TestContext) {
    for path in [
        "/api/audio/..%2F..%2Fetc%2Fpasswd",
        "/api/audio/secret.wav",
        "/api/audio/voice_maker_20250101_120000_deadbeef.mp3",
    ] {
        let response = ctx.client.get(path).await.unwrap();
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
