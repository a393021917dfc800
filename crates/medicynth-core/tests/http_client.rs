use std::sync::{Arc, Mutex};

use axum::{http::StatusCode, routing::post, Json, Router};
use medicynth_core::{
    ChatApi, ChatController, ChatRequest, Error, HttpChatClient, MemoryPreferences, ViewModel,
};
use serde_json::{json, Value};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn recording_chat(seen: Arc<Mutex<Vec<Value>>>, reply: Value) -> Router {
    Router::new().route(
        "/api/chat",
        post(move |Json(body): Json<Value>| {
            let seen = Arc::clone(&seen);
            let reply = reply.clone();
            async move {
                seen.lock().unwrap().push(body);
                Json(reply)
            }
        }),
    )
}

#[tokio::test]
async fn test_send_chat_posts_message_without_image() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let base = serve(recording_chat(
        Arc::clone(&seen),
        json!({ "response": "**Hi**", "detected_script": "latin", "history_length": 3 }),
    ))
    .await;

    let client = HttpChatClient::new(&base);
    let reply = client
        .send_chat(ChatRequest {
            message: "Hello".to_string(),
            image: None,
        })
        .await
        .unwrap();

    assert_eq!(reply.response, "**Hi**");
    assert_eq!(reply.detected_script.as_deref(), Some("latin"));
    assert_eq!(reply.history_length, Some(3));
    assert_eq!(*seen.lock().unwrap(), vec![json!({ "message": "Hello" })]);
}

#[tokio::test]
async fn test_error_body_becomes_failure_message() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "rate limited" })),
            )
        }),
    );
    let base = serve(router).await;

    let err = HttpChatClient::new(&base)
        .send_chat(ChatRequest {
            message: "Hello".to_string(),
            image: None,
        })
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_error_body_uses_fallback() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let base = serve(router).await;

    let err = HttpChatClient::new(&base)
        .send_chat(ChatRequest {
            message: "Hello".to_string(),
            image: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Failed to send message");
}

#[tokio::test]
async fn test_clear_history() {
    let router = Router::new().route(
        "/api/chat/clear",
        post(|| async { Json(json!({ "status": "cleared" })) }),
    );
    let base = serve(router).await;
    HttpChatClient::new(&base).clear_history().await.unwrap();

    let router = Router::new().route(
        "/api/chat/clear",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "down" })),
            )
        }),
    );
    let base = serve(router).await;
    let err = HttpChatClient::new(&base).clear_history().await.unwrap_err();
    assert_eq!(err.user_message(), "Failed to clear chat");
}

#[tokio::test]
async fn test_controller_round_trip_over_http() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let base = serve(recording_chat(
        Arc::clone(&seen),
        json!({ "response": "Stay *hydrated*", "history_length": 2 }),
    ))
    .await;

    let mut controller = ChatController::new(
        Arc::new(HttpChatClient::new(&base)),
        ViewModel::default(),
        Box::new(MemoryPreferences::default()),
    );
    controller.submit("  any advice?  ").await;

    let view = controller.view();
    assert_eq!(view.turns.len(), 3);
    assert_eq!(view.turns[2].markup, "Stay <em>hydrated</em>");
    assert_eq!(view.turns[2].context_line.as_deref(), Some("Context: 2 messages"));
    assert_eq!(seen.lock().unwrap()[0]["message"], "any advice?");
    assert!(!controller.is_loading());
}
