//! Integration tests driving the real router against core mocks.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use tower::ServiceExt;

use kaleido_client::ImageService;
use kaleido_core::AppError;
use kaleido_core::models::ChangeOutcome;
use kaleido_core::testutil::{
    MemoryImageStore, MockImageOrigin, MockLlm, MockPortal, make_test_page,
};
use kaleido_server::routes;
use kaleido_server::state::AppState;

const IMAGE_URL: &str = "https://cdn.example.com/theme_{id}.jpg";

fn test_app(
    portal: MockPortal,
    store: MemoryImageStore,
    origin: MockImageOrigin,
    llm: MockLlm,
) -> Router {
    let state = Arc::new(AppState {
        portal,
        images: ImageService::new(store, origin, IMAGE_URL),
        llm,
    });
    routes::router(state)
}

fn default_app() -> Router {
    test_app(
        MockPortal::new(),
        MemoryImageStore::new(),
        MockImageOrigin::new(b"img"),
        MockLlm::new("mock reply"),
    )
}

async fn post_json(
    app: Router,
    path: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

// ---------------------------------------------------------------------------
// Method and body validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn options_preflight_returns_204() {
    for path in [
        "/get-effect-list",
        "/change-effect",
        "/get-effect-image",
        "/ask-ai",
    ] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = default_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "path: {path}");
    }
}

#[tokio::test]
async fn wrong_method_is_405() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/get-effect-list")
        .body(Body::empty())
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_json_is_400() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/get-effect-list")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_ok() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = default_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// /get-effect-list
// ---------------------------------------------------------------------------

#[tokio::test]
async fn effect_list_with_existing_session() {
    let portal = MockPortal::with_page(make_test_page());
    let app = test_app(
        portal.clone(),
        MemoryImageStore::new(),
        MockImageOrigin::new(b"img"),
        MockLlm::new(""),
    );

    let (status, json) = post_json(
        app,
        "/get-effect-list",
        serde_json::json!({
            "sessionId": "sess-1",
            "page": 2,
            "mailAddress": "",
            "password": ""
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sessionId"], "sess-1");
    assert_eq!(json["dlSecKey"], "xyz");
    assert_eq!(json["isNext"], false);
    assert_eq!(json["effects"][0]["name"], "Red");
    assert_eq!(json["effects"][0]["id"], "42");
    assert_eq!(json["effects"][0]["hashId"], "abc");

    // No login happened; the list was fetched with the caller's session.
    assert!(portal.login_calls.lock().unwrap().is_empty());
    assert_eq!(
        portal.list_calls.lock().unwrap().as_slice(),
        [("sess-1".to_string(), 2)]
    );
}

#[tokio::test]
async fn effect_list_logs_in_when_session_is_empty() {
    let portal = MockPortal::with_login("fresh-session").and_page(make_test_page());
    let app = test_app(
        portal.clone(),
        MemoryImageStore::new(),
        MockImageOrigin::new(b"img"),
        MockLlm::new(""),
    );

    let (status, json) = post_json(
        app,
        "/get-effect-list",
        serde_json::json!({
            "sessionId": "",
            "page": 1,
            "mailAddress": "user@example.com",
            "password": "hunter2"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sessionId"], "fresh-session");
    assert_eq!(
        portal.login_calls.lock().unwrap().as_slice(),
        [("user@example.com".to_string(), "hunter2".to_string())]
    );
    assert_eq!(
        portal.list_calls.lock().unwrap().as_slice(),
        [("fresh-session".to_string(), 1)]
    );
}

#[tokio::test]
async fn effect_list_upstream_failure_is_502() {
    let portal = MockPortal::with_list_error(AppError::NetworkError("connection refused".into()));
    let app = test_app(
        portal,
        MemoryImageStore::new(),
        MockImageOrigin::new(b"img"),
        MockLlm::new(""),
    );

    let (status, json) = post_json(
        app,
        "/get-effect-list",
        serde_json::json!({"sessionId": "sess-1", "page": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "upstream_error");
}

// ---------------------------------------------------------------------------
// /change-effect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn change_effect_success() {
    let portal = MockPortal::with_change(ChangeOutcome {
        succeed: true,
        session_id: "sess-1".into(),
        dl_sec_key: "next-key".into(),
    });
    let app = test_app(
        portal.clone(),
        MemoryImageStore::new(),
        MockImageOrigin::new(b"img"),
        MockLlm::new(""),
    );

    let (status, json) = post_json(
        app,
        "/change-effect",
        serde_json::json!({
            "sessionId": "sess-1",
            "hashId": "abc",
            "dlSecKey": "old-key"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["succeed"], true);
    assert_eq!(json["sessionId"], "sess-1");
    assert_eq!(json["dlSecKey"], "next-key");
    assert_eq!(
        portal.change_calls.lock().unwrap().as_slice(),
        [(
            "sess-1".to_string(),
            "abc".to_string(),
            "old-key".to_string()
        )]
    );
}

#[tokio::test]
async fn change_effect_expired_session_clears_identifiers() {
    let portal = MockPortal::with_change(ChangeOutcome {
        succeed: false,
        session_id: String::new(),
        dl_sec_key: String::new(),
    });
    let app = test_app(
        portal,
        MemoryImageStore::new(),
        MockImageOrigin::new(b"img"),
        MockLlm::new(""),
    );

    let (status, json) = post_json(
        app,
        "/change-effect",
        serde_json::json!({
            "sessionId": "stale",
            "hashId": "abc",
            "dlSecKey": "old-key"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["succeed"], false);
    assert_eq!(json["sessionId"], "");
    assert_eq!(json["dlSecKey"], "");
}

// ---------------------------------------------------------------------------
// /get-effect-image
// ---------------------------------------------------------------------------

#[tokio::test]
async fn effect_image_from_store_without_origin_fetch() {
    let store = MemoryImageStore::with_object("images/42.jpg", b"stored jpeg");
    let origin = MockImageOrigin::new(b"origin jpeg");
    let app = test_app(MockPortal::new(), store, origin.clone(), MockLlm::new(""));

    let (status, json) = post_json(
        app,
        "/get-effect-image",
        serde_json::json!({"effectId": "42"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["succeed"], true);
    let decoded = {
        use base64::Engine as _;
        base64::engine::general_purpose::STANDARD
            .decode(json["image"].as_str().unwrap())
            .unwrap()
    };
    assert_eq!(decoded, b"stored jpeg");
    assert_eq!(origin.fetch_count(), 0);
}

#[tokio::test]
async fn effect_image_miss_fetches_origin_and_persists() {
    let store = MemoryImageStore::new();
    let origin = MockImageOrigin::new(b"origin jpeg");
    let app = test_app(
        MockPortal::new(),
        store.clone(),
        origin.clone(),
        MockLlm::new(""),
    );

    let (status, json) = post_json(
        app,
        "/get-effect-image",
        serde_json::json!({"effectId": "7"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["succeed"], true);
    assert_eq!(origin.fetch_count(), 1);
    assert_eq!(
        store.objects.lock().unwrap().get("images/7.jpg").unwrap(),
        b"origin jpeg"
    );
}

#[tokio::test]
async fn effect_image_invalid_id_is_400() {
    let (status, json) = post_json(
        default_app(),
        "/get-effect-image",
        serde_json::json!({"effectId": "../secrets"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

// ---------------------------------------------------------------------------
// /ask-ai
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ask_ai_returns_normalized_message() {
    let llm = MockLlm::new("the sky is blue");
    let app = test_app(
        MockPortal::new(),
        MemoryImageStore::new(),
        MockImageOrigin::new(b""),
        llm.clone(),
    );

    let (status, json) = post_json(
        app,
        "/ask-ai",
        serde_json::json!({
            "model": "gemini-1.5-flash",
            "prompt": "what color is the sky?",
            "temperature": 0.5
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "the sky is blue");

    let requests = llm.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].model,
        kaleido_core::models::ModelKind::Gemini15Flash
    );
    assert_eq!(requests[0].temperature, 0.5);
}

#[tokio::test]
async fn ask_ai_unknown_model_is_400() {
    let (status, json) = post_json(
        default_app(),
        "/ask-ai",
        serde_json::json!({"model": "gpt-5", "prompt": "hi"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn ask_ai_vendor_failure_is_descriptive_502() {
    let llm = MockLlm::with_error(AppError::LlmError {
        vendor: "openai",
        message: "model overloaded".into(),
        status_code: 503,
        retryable: true,
    });
    let app = test_app(
        MockPortal::new(),
        MemoryImageStore::new(),
        MockImageOrigin::new(b""),
        llm,
    );

    let (status, json) = post_json(
        app,
        "/ask-ai",
        serde_json::json!({"model": "gpt-4o", "prompt": "hi"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "llm_error");
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("openai"));
    assert!(message.contains("503"));
}
