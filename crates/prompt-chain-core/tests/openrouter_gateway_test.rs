//! Integration test: OpenRouterGateway against an in-process chat-completion endpoint.
//!
//! ## Scenarios
//! 1. 200 with `choices[0].message.content` → trimmed text; request carries bearer + body.
//! 2. 401 → AuthFailure, 500 → NonSuccessStatus.
//! 3. 200 without the completion field → MalformedEnvelope.
//! 4. Nothing listening → Transport.
//! 5. A reply slower than `timeout_secs` → Transport timeout.
//! 6. The gateway drives a full chain over HTTP.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use prompt_chain_core::{
    Category, ChainConfig, CustomerQuery, GatewayErrorKind, ModelGateway, OpenRouterGateway,
    Orchestrator,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Default)]
struct MockEndpoint {
    /// Responses served in order; the last one repeats.
    responses: Mutex<VecDeque<(StatusCode, String)>>,
    /// (Authorization header, request body) per call.
    requests: Mutex<Vec<(Option<String>, Value)>>,
}

async fn completions(
    State(mock): State<Arc<MockEndpoint>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    mock.requests.lock().await.push((auth, body));

    let mut responses = mock.responses.lock().await;
    let (status, body) = if responses.len() > 1 {
        responses.pop_front().unwrap()
    } else {
        responses.front().cloned().unwrap()
    };
    (status, [(header::CONTENT_TYPE, "application/json")], body)
}

fn completion(content: &str) -> String {
    json!({
        "id": "gen-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

/// Start a mock endpoint; returns its chat-completions URL.
async fn serve(responses: Vec<(StatusCode, String)>) -> (String, Arc<MockEndpoint>) {
    let mock = Arc::new(MockEndpoint {
        responses: Mutex::new(responses.into()),
        requests: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/api/v1/chat/completions", post(completions))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/api/v1/chat/completions", addr), mock)
}

fn gateway(url: &str) -> OpenRouterGateway {
    let config = ChainConfig::default()
        .with_api_key("sk-or-test")
        .with_api_url(url)
        .with_model("test/model");
    OpenRouterGateway::new(&config).unwrap()
}

#[tokio::test]
async fn success_returns_trimmed_content_and_sends_chat_request() {
    let (url, mock) = serve(vec![(StatusCode::OK, completion("  Card Services \n"))]).await;

    let text = gateway(&url).complete("Pick a category").await.unwrap();
    assert_eq!(text, "Card Services");

    let requests = mock.requests.lock().await;
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer sk-or-test"));
    assert_eq!(body["model"], "test/model");
    assert_eq!(
        body["messages"],
        json!([{"role": "user", "content": "Pick a category"}])
    );
}

#[tokio::test]
async fn auth_and_status_failures_are_typed() {
    let (url, _) = serve(vec![(
        StatusCode::UNAUTHORIZED,
        r#"{"error": {"message": "No auth credentials found"}}"#.to_string(),
    )])
    .await;
    let err = gateway(&url).complete("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::AuthFailure);

    let (url, _) = serve(vec![(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"error": "boom"}"#.to_string(),
    )])
    .await;
    let err = gateway(&url).complete("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::NonSuccessStatus);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn missing_completion_field_is_malformed_envelope() {
    let (url, _) = serve(vec![(StatusCode::OK, json!({"choices": []}).to_string())]).await;
    let err = gateway(&url).complete("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::MalformedEnvelope);
}

#[tokio::test]
async fn empty_prompt_never_reaches_the_service() {
    let (url, mock) = serve(vec![(StatusCode::OK, completion("x"))]).await;
    let err = gateway(&url).complete("  ").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::EmptyPrompt);
    assert!(mock.requests.lock().await.is_empty());
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{}/api/v1/chat/completions", addr);
    let err = gateway(&url).complete("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Transport);
}

#[tokio::test]
async fn configured_timeout_bounds_each_request() {
    let app = Router::new().route(
        "/api/v1/chat/completions",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            completion("too late")
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = ChainConfig::default()
        .with_api_key("sk-or-test")
        .with_api_url(&format!("http://{}/api/v1/chat/completions", addr));
    config.timeout_secs = 1;
    let gateway = OpenRouterGateway::new(&config).unwrap();

    let started = Instant::now();
    let err = gateway.complete("hi").await.unwrap_err();
    assert_eq!(err.kind(), GatewayErrorKind::Transport);
    assert!(err.to_string().contains("timed out"), "{}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn full_chain_over_http() {
    let (url, mock) = serve(vec![
        (
            StatusCode::OK,
            completion("The customer cannot log in to online banking."),
        ),
        (
            StatusCode::OK,
            completion(
                r#"[{"category": "Account Access", "justification": "Login failure."}]"#,
            ),
        ),
        (StatusCode::OK, completion("Account Access")),
        (
            StatusCode::OK,
            completion(r#"{"found_fields": {"channel": "online banking"}, "missing_fields": ["username", "error_message"]}"#),
        ),
        (
            StatusCode::OK,
            completion("Sorry you can't log in. Could you tell us your username so we can help?"),
        ),
    ])
    .await;

    let orchestrator = Orchestrator::new(Arc::new(gateway(&url)));
    let query = CustomerQuery::new("I can't log into online banking").unwrap();
    let result = orchestrator.run(&query).await.unwrap();

    assert_eq!(result.chosen().category(), Category::AccountAccess);
    assert_eq!(result.details().top_missing(), Some("username"));
    assert!(result.reply().as_str().contains("username"));
    assert_eq!(mock.requests.lock().await.len(), 5);
}
