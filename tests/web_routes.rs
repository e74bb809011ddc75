//! Integration tests for the web chat routes

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use aura::providers::Message;
use aura::storage::SqliteStorage;
use aura::web::{create_router, AppState};

use common::{chat_service, create_temp_storage, full_registry, FixedRetriever, ScriptedProvider};

fn app(replies: Vec<Message>, storage: SqliteStorage) -> Router {
    let chat = chat_service(
        Arc::new(ScriptedProvider::new(replies)),
        full_registry(Arc::new(FixedRetriever::default())),
        storage,
        20,
    );
    create_router(AppState {
        chat: Arc::new(chat),
        user_id: "web_user".to_string(),
        recent_sessions: 10,
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (storage, _dir) = create_temp_storage();
    let response = app(vec![], storage)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_index_redirects_to_a_new_session() {
    let (storage, _dir) = create_temp_storage();
    let response = app(vec![], storage.clone())
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.status().is_redirection());
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("/sessions/"));
    assert_eq!(storage.list_sessions("web_user", 10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_session_page_shows_greeting() {
    let (storage, _dir) = create_temp_storage();
    let response = app(vec![], storage)
        .oneshot(Request::get("/sessions/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("your IoT troubleshooting assistant"));
    assert!(html.contains("/sessions/abc/messages"));
}

#[tokio::test]
async fn test_api_chat_runs_and_persists_turn() {
    let (storage, _dir) = create_temp_storage();
    let app = app(vec![Message::assistant("Try restarting the hub.")], storage.clone());

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/sessions/s1/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message":"Hub is offline"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["answer"], "Try restarting the hub.");
    assert_eq!(body["degraded"], false);
    assert_eq!(body["persisted"], true);

    let response = app
        .oneshot(
            Request::get("/api/sessions/s1/messages")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(storage.message_count("web_user", "s1").unwrap(), 2);
}

#[tokio::test]
async fn test_api_chat_rejects_empty_message() {
    let (storage, _dir) = create_temp_storage();
    let response = app(vec![], storage)
        .oneshot(
            Request::post("/api/sessions/s1/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message":"   "}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["status"], 400);
}

#[tokio::test]
async fn test_form_post_redirects_back_to_session() {
    let (storage, _dir) = create_temp_storage();
    let response = app(vec![Message::assistant("Checking.")], storage.clone())
        .oneshot(
            Request::post("/sessions/s2/messages")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("message=Device+AURA-1+is+slow"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/sessions/s2");

    let stored = storage.load_messages("web_user", "s2", 10).unwrap();
    assert_eq!(stored[0].text(), "Device AURA-1 is slow");
}

#[tokio::test]
async fn test_api_create_list_and_delete_session() {
    let (storage, _dir) = create_temp_storage();
    let app = app(vec![], storage.clone());

    let response = app
        .clone()
        .oneshot(Request::post("/api/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["session_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(Request::get("/api/sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["sessions"][0]["session_id"], id.as_str());

    storage
        .append_messages("web_user", &id, &[Message::user("hi")], 1)
        .unwrap();
    let response = app
        .oneshot(
            Request::delete(format!("/api/sessions/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["messages_removed"], 1);
    assert!(storage.list_sessions("web_user", 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_store_still_renders_greeting() {
    let (storage, dir) = create_temp_storage();
    let app = app(vec![], storage);
    drop(dir);

    let response = app
        .oneshot(Request::get("/sessions/lost").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("your IoT troubleshooting assistant"));
    assert!(html.contains("/sessions/lost/messages"));
}

#[tokio::test]
async fn test_unreachable_store_index_still_redirects() {
    let (storage, dir) = create_temp_storage();
    let app = app(vec![], storage);
    drop(dir);

    let response = app
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/sessions/"));

    let response = app
        .oneshot(Request::get(location).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("your IoT troubleshooting assistant"));
}
