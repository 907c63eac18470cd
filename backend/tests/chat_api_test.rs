//! Integration tests for the chat proxy endpoint
//!
//! These tests drive the full router with a fake text generator:
//! 1. Input validation (missing message, bad history, disallowed files)
//! 2. JSON replies and paced plain-text replies
//! 3. Upstream failures mapped to generic errors
//! 4. Multipart uploads forwarded as inline data

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gemini_chat_backend::api::router;
use gemini_chat_backend::chat::ChatReply;
use gemini_chat_backend::config::Config;
use gemini_chat_backend::gemini::{Content, GeminiError, Part, Role, TextGenerator};
use gemini_chat_backend::state::AppState;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// What the fake generator should do when called
#[derive(Clone)]
enum Behaviour {
    Reply(String),
    Fail,
    Empty,
}

/// Generator that records every conversation it receives
struct FakeGenerator {
    behaviour: Behaviour,
    calls: Mutex<Vec<Vec<Content>>>,
}

impl FakeGenerator {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn last_call(&self) -> Vec<Content> {
        self.calls.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, contents: Vec<Content>) -> Result<String, GeminiError> {
        self.calls.lock().unwrap().push(contents);
        match &self.behaviour {
            Behaviour::Reply(text) => Ok(text.clone()),
            Behaviour::Fail => Err(GeminiError::Status {
                status: 403,
                body: "API key not valid. Please pass a valid API key.".to_string(),
            }),
            Behaviour::Empty => Err(GeminiError::EmptyResponse),
        }
    }
}

/// Helper to create a test app with priming disabled and no stream delay
fn create_test_app(generator: Arc<FakeGenerator>) -> Router {
    let mut config = Config::default();
    config.chat.priming_enabled = false;
    config.chat.stream_char_delay_ms = 0;
    router(AppState::new(config, generator))
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "----chat-test-boundary";

/// One part of a hand-built multipart form
struct FormPart {
    name: &'static str,
    file: Option<(&'static str, &'static str)>,
    data: Vec<u8>,
}

fn text_field(name: &'static str, value: &str) -> FormPart {
    FormPart {
        name,
        file: None,
        data: value.as_bytes().to_vec(),
    }
}

fn file_field(file_name: &'static str, content_type: &'static str, data: &[u8]) -> FormPart {
    FormPart {
        name: "files",
        file: Some((file_name, content_type)),
        data: data.to_vec(),
    }
}

fn multipart_request(parts: Vec<FormPart>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file_name, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn read_reply(response: axum::response::Response) -> ChatReply {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("body should be {reply} JSON")
}

async fn read_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_hello_without_stream_returns_json_reply() {
    let generator = FakeGenerator::new(Behaviour::Reply("Halo! Ada yang bisa saya bantu?".into()));
    let app = create_test_app(generator.clone());

    let response = app
        .oneshot(json_request(r#"{"message": "hello", "history": [], "stream": false}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let reply = read_reply(response).await;
    assert_eq!(reply.reply, "Halo! Ada yang bisa saya bantu?");
    assert_eq!(generator.call_count(), 1);
    assert_eq!(
        generator.last_call(),
        vec![Content::text(Role::User, "hello")]
    );
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let app = create_test_app(generator.clone());

    let response = app.oneshot(json_request("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply = read_reply(response).await;
    assert!(reply.reply.starts_with("Message is required"));
    assert_eq!(generator.call_count(), 0);
}

fn chat_request(content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri("/api/chat");
    if let Some(content_type) = content_type {
        builder = builder.header(header::CONTENT_TYPE, content_type);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_missing_or_non_json_body_reads_as_empty_object() {
    let cases = [
        (None, ""),
        (None, "{}"),
        (Some("application/json"), ""),
        (Some("text/plain"), r#"{"message": "hello"}"#),
    ];

    for (content_type, body) in cases {
        let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
        let app = create_test_app(generator.clone());

        let response = app.oneshot(chat_request(content_type, body)).await.unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "content type {:?}, body {:?}",
            content_type,
            body
        );
        let reply = read_reply(response).await;
        assert!(
            reply.reply.starts_with("Message is required"),
            "unexpected reply {:?}",
            reply.reply
        );
        assert_eq!(generator.call_count(), 0);
    }
}

#[tokio::test]
async fn test_json_with_charset_is_parsed() {
    let generator = FakeGenerator::new(Behaviour::Reply("Halo!".into()));
    let app = create_test_app(generator.clone());

    let response = app
        .oneshot(chat_request(
            Some("application/json; charset=utf-8"),
            r#"{"message": "hello", "stream": false}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_reply(response).await.reply, "Halo!");
}

#[tokio::test]
async fn test_malformed_history_is_rejected() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let app = create_test_app(generator.clone());

    let response = app
        .oneshot(json_request(r#"{"message": "hi", "history": "not a list"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply = read_reply(response).await;
    assert!(!reply.reply.is_empty());
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_invalid_json_is_rejected() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let app = create_test_app(generator.clone());

    let response = app.oneshot(json_request("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply = read_reply(response).await;
    assert!(reply.reply.contains("Failed to parse the request body as JSON"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_history_is_forwarded_in_order() {
    let generator = FakeGenerator::new(Behaviour::Reply("Paris.".into()));
    let app = create_test_app(generator.clone());

    let body = r#"{
        "message": "And its capital?",
        "history": [
            {"sender": "user", "text": "Tell me about France"},
            {"sender": "bot", "text": "France is a country in Europe."}
        ],
        "stream": "false"
    }"#;
    let response = app.oneshot(json_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        generator.last_call(),
        vec![
            Content::text(Role::User, "Tell me about France"),
            Content::text(Role::Model, "France is a country in Europe."),
            Content::text(Role::User, "And its capital?"),
        ]
    );
}

#[tokio::test]
async fn test_priming_turns_are_prepended() {
    let generator = FakeGenerator::new(Behaviour::Reply("ok".into()));
    let mut config = Config::default();
    config.chat.response_language = "English".to_string();
    let app = router(AppState::new(config, generator.clone()));

    let response = app
        .oneshot(json_request(r#"{"message": "hi", "stream": false}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let call = generator.last_call();
    assert_eq!(call.len(), 3);
    assert_eq!(call[0].role, Role::User);
    assert_eq!(call[1].role, Role::Model);
    assert_eq!(call[2], Content::text(Role::User, "hi"));
}

#[tokio::test]
async fn test_stream_concatenates_to_json_reply() {
    let text = "Berikut jawabannya: 42 ✓";
    let generator = FakeGenerator::new(Behaviour::Reply(text.into()));

    let json_response = create_test_app(generator.clone())
        .oneshot(json_request(r#"{"message": "q", "stream": false}"#))
        .await
        .unwrap();
    let json_reply = read_reply(json_response).await.reply;

    let stream_response = create_test_app(generator.clone())
        .oneshot(json_request(r#"{"message": "q", "stream": true}"#))
        .await
        .unwrap();
    assert_eq!(stream_response.status(), StatusCode::OK);
    assert!(stream_response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let streamed = read_text(stream_response).await;

    assert_eq!(streamed, json_reply);
    assert_eq!(streamed, text);
}

#[tokio::test]
async fn test_stream_defaults_to_configured_value() {
    let generator = FakeGenerator::new(Behaviour::Reply("streamed".into()));
    let app = create_test_app(generator);

    let response = app
        .oneshot(json_request(r#"{"message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(read_text(response).await, "streamed");
}

#[tokio::test]
async fn test_upstream_failure_is_generic_500() {
    let generator = FakeGenerator::new(Behaviour::Fail);
    let app = create_test_app(generator);

    let response = app
        .oneshot(json_request(r#"{"message": "hi", "stream": true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let reply = read_reply(response).await;
    assert_eq!(reply.reply, "Something went wrong");
    assert!(!reply.reply.contains("API key"));
}

#[tokio::test]
async fn test_empty_upstream_reply_is_500() {
    let generator = FakeGenerator::new(Behaviour::Empty);
    let app = create_test_app(generator);

    let response = app
        .oneshot(json_request(r#"{"message": "hi", "stream": false}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(read_reply(response).await.reply, "No response from AI");
}

#[tokio::test]
async fn test_whitespace_upstream_reply_is_500() {
    let generator = FakeGenerator::new(Behaviour::Reply("   ".into()));
    let app = create_test_app(generator);

    let response = app
        .oneshot(json_request(r#"{"message": "hi", "stream": false}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_multipart_file_is_forwarded_inline() {
    let generator = FakeGenerator::new(Behaviour::Reply("A red dot.".into()));
    let app = create_test_app(generator.clone());

    let request = multipart_request(vec![
        text_field("message", "What is in this image?"),
        text_field(
            "history",
            r#"[{"sender":"user","text":"hi"},{"sender":"bot","text":"hello"}]"#,
        ),
        text_field("stream", "false"),
        file_field("dot.png", "image/png", &[0, 1, 2]),
    ]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_reply(response).await.reply, "A red dot.");

    let call = generator.last_call();
    assert_eq!(call.len(), 3);
    let current = &call[2];
    assert_eq!(current.role, Role::User);
    assert_eq!(current.parts.len(), 2);
    match &current.parts[1] {
        Part::InlineData { inline_data } => {
            assert_eq!(inline_data.mime_type, "image/png");
            assert_eq!(inline_data.data, "AAEC");
        }
        other => panic!("expected inline data, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multipart_mime_parameters_are_not_forwarded() {
    let generator = FakeGenerator::new(Behaviour::Reply("A note.".into()));
    let app = create_test_app(generator.clone());

    let request = multipart_request(vec![
        text_field("stream", "false"),
        file_field("note.txt", "Text/Plain; charset=utf-8", b"remember the milk"),
    ]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let call = generator.last_call();
    match &call[0].parts[0] {
        Part::InlineData { inline_data } => assert_eq!(inline_data.mime_type, "text/plain"),
        other => panic!("expected inline data, got {:?}", other),
    }
}

#[tokio::test]
async fn test_multipart_attachment_without_message() {
    let generator = FakeGenerator::new(Behaviour::Reply("Transcript.".into()));
    let app = create_test_app(generator.clone());

    let request = multipart_request(vec![
        text_field("stream", "false"),
        file_field("note.txt", "text/plain", b"remember the milk"),
    ]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let call = generator.last_call();
    assert_eq!(call[0].parts.len(), 1);
}

#[tokio::test]
async fn test_multipart_disallowed_mime_type_never_reaches_upstream() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let app = create_test_app(generator.clone());

    let request = multipart_request(vec![
        text_field("message", "run this"),
        file_field("setup.exe", "application/x-msdownload", b"MZ"),
    ]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let reply = read_reply(response).await;
    assert!(reply.reply.contains("Unsupported file type"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_multipart_too_many_files() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let mut config = Config::default();
    config.uploads.max_files = 1;
    let app = router(AppState::new(config, generator.clone()));

    let request = multipart_request(vec![
        text_field("message", "two files"),
        file_field("a.txt", "text/plain", b"a"),
        file_field("b.txt", "text/plain", b"b"),
    ]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_multipart_oversized_file() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let mut config = Config::default();
    config.uploads.max_file_size_bytes = 4;
    let app = router(AppState::new(config, generator.clone()));

    let request = multipart_request(vec![file_field("big.txt", "text/plain", b"0123456789")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_multipart_without_message_or_files() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let app = create_test_app(generator.clone());

    let request = multipart_request(vec![text_field("message", ""), text_field("stream", "false")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(read_reply(response).await.reply.starts_with("Message is required"));
    assert_eq!(generator.call_count(), 0);
}

#[tokio::test]
async fn test_health_check() {
    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let app = create_test_app(generator);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "healthy");
}

#[tokio::test]
async fn test_static_dir_is_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>chat</h1>").unwrap();

    let generator = FakeGenerator::new(Behaviour::Reply("unused".into()));
    let mut config = Config::default();
    config.server.static_dir = Some(dir.path().to_path_buf());
    let app = router(AppState::new(config, generator));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_text(response).await, "<h1>chat</h1>");
}
