//! HTTP API integration tests
//!
//! Drives the full router with a scripted agent through `tower::ServiceExt`.
//! Covers batch chat, the SSE stream protocol, history, health, validation,
//! and the informational endpoints.

use std::sync::{Arc, Mutex};

use a3s_chat::config::ChatConfig;
use a3s_chat::server::router;
use a3s_chat::server::state::AppState;
use a3s_chat::{Agent, ChatError, ConversationStore, ResponseEvent, ResponseStream, Role};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

/// Agent that replays a fixed event script, optionally ending in a failure.
struct ScriptedAgent {
    events: Vec<ResponseEvent>,
    failure: Option<String>,
    tasks: Mutex<Vec<String>>,
}

impl ScriptedAgent {
    fn new(events: Vec<ResponseEvent>) -> Self {
        Self {
            events,
            failure: None,
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn failing(events: Vec<ResponseEvent>, error: &str) -> Self {
        Self {
            failure: Some(error.to_string()),
            ..Self::new(events)
        }
    }
}

impl Agent for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn invoke_streaming(&self, task: &str) -> ResponseStream {
        self.tasks.lock().unwrap().push(task.to_string());
        let mut items: Vec<a3s_chat::Result<ResponseEvent>> =
            self.events.iter().cloned().map(Ok).collect();
        if let Some(error) = &self.failure {
            items.push(Err(ChatError::Upstream(error.clone())));
        }
        Box::pin(futures::stream::iter(items))
    }
}

fn delta(s: &str) -> ResponseEvent {
    ResponseEvent::Delta(s.to_string())
}

struct TestApp {
    router: Router,
    store: Arc<ConversationStore>,
    agent: Arc<ScriptedAgent>,
    _frontend: tempfile::TempDir,
}

fn test_app(agent: ScriptedAgent) -> TestApp {
    let frontend = tempfile::tempdir().unwrap();
    std::fs::write(frontend.path().join("index.html"), "<h1>chat</h1>").unwrap();

    let mut config = ChatConfig::default();
    config.frontend_dir = frontend.path().to_path_buf();

    let agent = Arc::new(agent);
    let store = Arc::new(ConversationStore::new());
    let state = AppState::new(agent.clone(), store.clone(), Arc::new(config));

    TestApp {
        router: router::build(state),
        store,
        agent,
        _frontend: frontend,
    }
}

fn chat_request(uri: &str, message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({ "message": message }).to_string(),
        ))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.router.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn send_json(app: &TestApp, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_str(&body).unwrap())
}

/// Payloads of every `data:` line in an SSE body.
fn sse_payloads(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.trim_start().to_string())
        .collect()
}

fn frame(payload: &str) -> serde_json::Value {
    serde_json::from_str(payload).unwrap()
}

// ─── Batch chat ──────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_returns_reply_and_records_turns() {
    let app = test_app(ScriptedAgent::new(vec![
        delta("Hel"),
        delta("lo"),
        ResponseEvent::FinalMessage("Hello there".into()),
    ]));

    let (status, json) = send_json(&app, chat_request("/chat", "hi")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["content"], "Hello there");
    assert_eq!(json["model_info"]["model"], "deepseek-chat");
    assert_eq!(json["model_info"]["provider"], "DeepSeek");
    assert!(json["timestamp"].is_string());

    let turns = app.store.all();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::User);
    assert_eq!(turns[0].content, "hi");
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Hello there");
    assert_eq!(app.agent.tasks.lock().unwrap().as_slice(), ["hi"]);
}

#[tokio::test]
async fn test_chat_failure_keeps_user_turn_only() {
    let app = test_app(ScriptedAgent::failing(vec![delta("par")], "model offline"));

    let (status, json) = send_json(&app, chat_request("/chat", "hi")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], 500);
    assert!(json["error"].as_str().unwrap().contains("model offline"));
    assert!(json["timestamp"].is_string());

    let turns = app.store.all();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
}

// ─── Validation ──────────────────────────────────────────────────

#[tokio::test]
async fn test_oversized_message_rejected() {
    let app = test_app(ScriptedAgent::new(vec![delta("x")]));
    let long = "a".repeat(2001);

    for uri in ["/chat", "/chat/stream"] {
        let (status, json) = send_json(&app, chat_request(uri, &long)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
        assert_eq!(json["code"], 422);
    }
    assert!(app.store.is_empty());
    assert!(app.agent.tasks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_message_at_limit_accepted() {
    let app = test_app(ScriptedAgent::new(vec![delta("ok")]));
    let (status, _) = send_json(&app, chat_request("/chat", &"é".repeat(2000))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_body_rejected() {
    let app = test_app(ScriptedAgent::new(vec![delta("x")]));
    let req = Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"msg": "wrong field"}"#))
        .unwrap();

    let (status, json) = send_json(&app, req).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json["error"].is_string());
    assert!(app.store.is_empty());
}

// ─── Streaming ───────────────────────────────────────────────────

#[tokio::test]
async fn test_stream_frames_in_order() {
    let app = test_app(ScriptedAgent::new(vec![
        delta("Hel"),
        delta("lo"),
        ResponseEvent::FinalMessage("Hello world".into()),
    ]));

    let (status, body) = send(&app, chat_request("/chat/stream", "hi")).await;
    assert_eq!(status, StatusCode::OK);

    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 5, "{body}");
    assert_eq!(frame(&payloads[0])["type"], "start");
    assert!(frame(&payloads[0])["timestamp"].is_string());
    assert_eq!(frame(&payloads[1]), serde_json::json!({"type": "content", "content": "Hel"}));
    assert_eq!(frame(&payloads[2]), serde_json::json!({"type": "content", "content": "lo"}));
    assert_eq!(
        frame(&payloads[3]),
        serde_json::json!({"type": "complete", "full_response": "Hello world"})
    );
    assert_eq!(payloads[4], "[DONE]");

    let turns = app.store.all();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].content, "Hello world");
}

#[tokio::test]
async fn test_stream_aggregate_only() {
    let app = test_app(ScriptedAgent::new(vec![ResponseEvent::Aggregate(
        "Answer".into(),
    )]));

    let (_, body) = send(&app, chat_request("/chat/stream", "q")).await;
    let payloads = sse_payloads(&body);
    let types: Vec<_> = payloads[..payloads.len() - 1]
        .iter()
        .map(|p| frame(p)["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, ["start", "complete"]);
    assert_eq!(frame(&payloads[1])["full_response"], "Answer");
    assert_eq!(payloads.last().unwrap(), "[DONE]");
}

#[tokio::test]
async fn test_stream_failure_emits_error_frame() {
    let app = test_app(ScriptedAgent::failing(vec![delta("A")], "upstream reset"));

    let (status, body) = send(&app, chat_request("/chat/stream", "hi")).await;
    assert_eq!(status, StatusCode::OK);

    let payloads = sse_payloads(&body);
    assert_eq!(payloads.len(), 4, "{body}");
    assert_eq!(frame(&payloads[0])["type"], "start");
    assert_eq!(frame(&payloads[1])["content"], "A");
    let error = frame(&payloads[2]);
    assert_eq!(error["type"], "error");
    assert!(error["error"].as_str().unwrap().contains("upstream reset"));
    assert_eq!(payloads[3], "[DONE]");
    assert!(!body.contains("complete"));

    let turns = app.store.all();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::User);
}

/// Agent whose stream records the name of the span it is polled in.
struct SpanAgent {
    seen: Arc<Mutex<Vec<Option<String>>>>,
}

impl Agent for SpanAgent {
    fn name(&self) -> &str {
        "span"
    }

    fn invoke_streaming(&self, _task: &str) -> ResponseStream {
        let seen = self.seen.clone();
        Box::pin(futures::stream::once(async move {
            let name = tracing::Span::current()
                .metadata()
                .map(|m| m.name().to_string());
            seen.lock().unwrap().push(name);
            Ok(delta("traced"))
        }))
    }
}

#[tokio::test]
async fn test_stream_runs_inside_request_span() {
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let state = AppState::new(
        Arc::new(SpanAgent { seen: seen.clone() }),
        Arc::new(ConversationStore::new()),
        Arc::new(ChatConfig::default()),
    );
    let resp = router::build(state)
        .oneshot(chat_request("/chat/stream", "hi"))
        .await
        .unwrap();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&body).contains("traced"));

    assert_eq!(seen.lock().unwrap().as_slice(), [Some("chat".to_string())]);
}

#[tokio::test]
async fn test_stream_content_type() {
    let app = test_app(ScriptedAgent::new(vec![delta("x")]));
    let resp = app
        .router
        .clone()
        .oneshot(chat_request("/chat/stream", "hi"))
        .await
        .unwrap();
    let content_type = resp.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

// ─── History ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_history_list_and_clear() {
    let app = test_app(ScriptedAgent::new(vec![delta("pong")]));
    send(&app, chat_request("/chat", "ping")).await;

    let (status, json) = send_json(&app, get("/chat/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 2);
    assert_eq!(json["history"][0]["role"], "user");
    assert_eq!(json["history"][0]["content"], "ping");
    assert_eq!(json["history"][1]["role"], "assistant");
    assert_eq!(json["history"][1]["content"], "pong");

    let req = Request::builder()
        .method("DELETE")
        .uri("/chat/history")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send_json(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Conversation history cleared");

    let (_, json) = send_json(&app, get("/chat/history")).await;
    assert_eq!(json["count"], 0);
    assert_eq!(json["history"], serde_json::json!([]));
}

// ─── Health & info ───────────────────────────────────────────────

#[tokio::test]
async fn test_health_ok() {
    let app = test_app(ScriptedAgent::new(vec![delta("hi")]));
    let (status, json) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["model_status"], "healthy");
    assert_eq!(json["conversation_count"], 0);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn test_health_failure_is_500() {
    let app = test_app(ScriptedAgent::failing(Vec::new(), "no route to model"));
    let (status, json) = send_json(&app, get("/health")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], 500);
    let error = json["error"].as_str().unwrap();
    assert!(error.starts_with("Health check failed"), "{error}");
    assert_eq!(error, "Health check failed: Upstream error: no route to model");
}

#[tokio::test]
async fn test_root_and_docs() {
    let app = test_app(ScriptedAgent::new(Vec::new()));

    let (status, json) = send_json(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "A3S Chat API");
    assert_eq!(json["docs"], "/docs");

    let (status, json) = send_json(&app, get("/docs")).await;
    assert_eq!(status, StatusCode::OK);
    let paths: Vec<_> = json["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap().to_string())
        .collect();
    assert!(paths.contains(&"/chat/stream".to_string()));
}

#[tokio::test]
async fn test_static_frontend_served() {
    let app = test_app(ScriptedAgent::new(Vec::new()));
    let (status, body) = send(&app, get("/static/index.html")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>chat</h1>");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = test_app(ScriptedAgent::new(Vec::new()));
    let (status, _) = send(&app, get("/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
