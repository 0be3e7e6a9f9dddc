//! API endpoint integration tests
//!
//! These exercise routing, request validation, and error shapes without
//! talking to any hosted provider.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use aria_gateway::api::{self, ApiState};
use aria_gateway::config::{ChatProvider, Settings};

fn test_settings() -> Settings {
    Settings {
        chat_provider: ChatProvider::Gemini,
        gemini_api_key: Some("test-key".to_string()),
        gemini_chat_model: "gemini-2.5-flash".to_string(),
        gemini_stt_model: "gemini-2.5-flash".to_string(),
        groq_api_key: None,
        groq_model: "llama-3.1-8b-instant".to_string(),
        persona_name: "Aria".to_string(),
        persona: "You are a test assistant.".to_string(),
        language: "en".to_string(),
        translate: false,
        whisper_binary: "whisper-cli".to_string(),
        whisper_model_path: None,
        speech_rate: 160,
        speech_volume: 1.0,
        voice_keywords: vec!["female".to_string()],
        max_history_messages: 6,
        temperature: 0.9,
        max_tokens: 200,
        logging_level: "info".to_string(),
        static_dir: None,
        config_file: None,
    }
}

fn build_test_router() -> axum::Router {
    let state = Arc::new(ApiState::from_settings(test_settings()).unwrap());
    api::router(state)
}

/// Assemble a multipart/form-data body by hand
fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"blob\"\r\n")
                .as_bytes(),
        );
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_chat_rejects_empty_messages() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"messages": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["detail"], "No messages provided");
}

#[tokio::test]
async fn test_chat_rejects_malformed_body() {
    let app = build_test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"messages": "nope"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_transcribe_rejects_unsupported_format() {
    let app = build_test_router();

    let boundary = "aria-test-boundary";
    let body = multipart_body(boundary, &[("file", Some("image/png"), b"not audio")]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transcribe")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["detail"], "Unsupported audio format: image/png");
}

#[tokio::test]
async fn test_transcribe_requires_a_file_part() {
    let app = build_test_router();

    let boundary = "aria-test-boundary";
    let body = multipart_body(boundary, &[("language", None, b"en")]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transcribe")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["detail"], "No audio file provided");
}

#[tokio::test]
async fn test_transcribe_rejects_empty_upload() {
    let app = build_test_router();

    let boundary = "aria-test-boundary";
    let body = multipart_body(boundary, &[("file", Some("audio/wav"), b"")]);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/transcribe")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

    assert_eq!(json["detail"], "Empty audio file");
}
