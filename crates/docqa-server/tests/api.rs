//! API tests — drive the router in-process and check response shapes and
//! status codes the web client relies on.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use docqa_chat::{BoxedStream, ChatMessage, CompletionClient, StreamChunk};
use docqa_core::{DocQaConfig, Error};
use docqa_server::{build_router, AppState};
use tower::ServiceExt;

const BOUNDARY: &str = "docqa-test-boundary";

struct FixedAnswer {
    chunks: fn() -> Vec<StreamChunk>,
}

impl CompletionClient for FixedAnswer {
    fn complete(&self, system_context: &str, _transcript: &[ChatMessage]) -> BoxedStream {
        assert!(system_context.starts_with("Here's the file content:"));
        Box::pin(tokio_stream::iter((self.chunks)()))
    }

    fn model(&self) -> &str {
        "test-model"
    }
}

fn blue_sky() -> Vec<StreamChunk> {
    vec![
        StreamChunk::Token("The sky ".into()),
        StreamChunk::Token("is blue.".into()),
        StreamChunk::Done { tokens_used: 2 },
    ]
}

fn rate_limited() -> Vec<StreamChunk> {
    vec![StreamChunk::Error(Error::RateLimit("API returned 429: slow down".into()))]
}

fn app_with(chunks: Option<fn() -> Vec<StreamChunk>>) -> Router {
    let completion =
        chunks.map(|chunks| Arc::new(FixedAnswer { chunks }) as Arc<dyn CompletionClient>);
    build_router(Arc::new(AppState::new(
        DocQaConfig::default(),
        completion,
        None,
    )))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, request).await;
    (status, serde_json::from_str(&body).unwrap())
}

async fn create_session(app: &Router) -> String {
    let request = Request::post("/api/sessions").body(Body::empty()).unwrap();
    let (status, json) = send_json(app, request).await;
    assert_eq!(status, StatusCode::OK);
    json["sessionId"].as_str().unwrap().to_string()
}

fn upload_request(session: &str, files: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, content_type, content) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::post(format!("/api/sessions/{}/documents", session))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn chat_request(session: &str, message: &str) -> Request<Body> {
    Request::post(format!("/api/sessions/{}/chat", session))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "message": message }).to_string(),
        ))
        .unwrap()
}

fn get(uri: String) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_new_session_has_greeting() {
    let app = app_with(Some(blue_sky));
    let request = Request::post("/api/sessions").body(Body::empty()).unwrap();
    let (status, json) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["sessionId"].is_string());
    assert_eq!(json["transcript"].as_array().unwrap().len(), 1);
    assert_eq!(json["transcript"][0]["role"], "assistant");
    assert_eq!(
        json["transcript"][0]["content"],
        "Please upload documents and ask questions!"
    );
    assert_eq!(json["documents"], serde_json::json!([]));
}

#[tokio::test]
async fn test_upload_reports_each_file() {
    let app = app_with(Some(blue_sky));
    let id = create_session(&app).await;

    let request = upload_request(
        &id,
        &[
            ("notes.txt", "text/plain", "The sky is blue."),
            ("photo.png", "image/png", "PNG"),
        ],
    );
    let (status, json) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["processed"], 1);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["results"][0]["filename"], "notes.txt");
    assert_eq!(json["results"][0]["message"], "Processed notes.txt");
    assert_eq!(json["results"][1]["status"], "failed");
    assert_eq!(json["results"][1]["kind"], "unsupported_type");
    assert_eq!(
        json["results"][1]["message"],
        "Unsupported file type: photo.png. Only .txt or .pdf formats are allowed."
    );
    assert_eq!(json["documents"], serde_json::json!(["notes.txt"]));

    let (status, listing) = send_json(&app, get(format!("/api/sessions/{}/documents", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["documents"][0]["characters"], 16);
}

#[tokio::test]
async fn test_chat_streams_answer_and_commits_it() {
    let app = app_with(Some(blue_sky));
    let id = create_session(&app).await;
    send(&app, upload_request(&id, &[("notes.txt", "text/plain", "The sky is blue.")])).await;

    let (status, body) = send(&app, chat_request(&id, "What color is the sky?")).await;
    assert_eq!(status, StatusCode::OK);

    let payloads: Vec<&str> = body
        .lines()
        .filter_map(|line| line.strip_prefix("data:").map(str::trim_start))
        .collect();
    assert_eq!(payloads.len(), 4);
    let first: serde_json::Value = serde_json::from_str(payloads[0]).unwrap();
    assert_eq!(first["type"], "token");
    assert_eq!(first["content"], "The sky ");
    let done: serde_json::Value = serde_json::from_str(payloads[2]).unwrap();
    assert_eq!(done["type"], "done");
    assert_eq!(done["model"], "test-model");
    assert_eq!(done["tokensUsed"], 2);
    assert_eq!(payloads[3], "[DONE]");

    let (_, session) = send_json(&app, get(format!("/api/sessions/{}", id))).await;
    assert_eq!(session["state"], "idle");
    assert_eq!(session["canQuery"], true);
    let transcript = session["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 3);
    assert_eq!(transcript[2]["content"], "The sky is blue.");
}

#[tokio::test]
async fn test_chat_failure_streams_error_event() {
    let app = app_with(Some(rate_limited));
    let id = create_session(&app).await;
    send(&app, upload_request(&id, &[("a.txt", "text/plain", "alpha")])).await;

    let (status, body) = send(&app, chat_request(&id, "Summarize")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"type\":\"error\""));
    assert!(body.contains("\"kind\":\"rate_limit\""));
    assert!(!body.contains("[DONE]"));

    let (_, session) = send_json(&app, get(format!("/api/sessions/{}", id))).await;
    let transcript = session["transcript"].as_array().unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1]["role"], "user");
    assert!(transcript[1]["error"].as_str().unwrap().contains("slow down"));
}

#[tokio::test]
async fn test_chat_rejections() {
    let app = app_with(Some(blue_sky));
    let id = create_session(&app).await;

    let (status, json) = send_json(&app, chat_request(&id, "Anything?")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["kind"], "rejected");

    let (status, _) = send_json(&app, chat_request(&id, "   ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send_json(&app, chat_request("no-such-session", "Hi")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");

    let (_, session) = send_json(&app, get(format!("/api/sessions/{}", id))).await;
    assert_eq!(session["transcript"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_without_credentials_is_unavailable() {
    let app = app_with(None);
    let id = create_session(&app).await;
    send(&app, upload_request(&id, &[("a.txt", "text/plain", "alpha")])).await;

    let (status, json) = send_json(&app, chat_request(&id, "Hi")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["kind"], "auth");

    // An unknown session is reported as such even without credentials.
    let (status, json) = send_json(&app, chat_request("no-such-session", "Hi")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["kind"], "not_found");
}

#[tokio::test]
async fn test_status_shape() {
    let app = app_with(None);
    create_session(&app).await;

    let (status, json) = send_json(&app, get("/api/status".to_string())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["llmConfigured"], false);
    assert!(json["provider"].is_null());
    assert_eq!(json["chunkSize"], 1000);
    assert_eq!(json["chunkOverlap"], 200);
    assert_eq!(json["sessions"], 1);
}

#[tokio::test]
async fn test_delete_session() {
    let app = app_with(Some(blue_sky));
    let id = create_session(&app).await;

    let delete = |id: &str| {
        Request::delete(format!("/api/sessions/{}", id))
            .body(Body::empty())
            .unwrap()
    };
    let (status, json) = send_json(&app, delete(&id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deleted"], true);

    let (status, _) = send_json(&app, delete(&id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(&app, get(format!("/api/sessions/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
