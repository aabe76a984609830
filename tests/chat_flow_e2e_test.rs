// ABOUTME: End-to-end flow over HTTP: register, log in, stream a chat, read it back
// ABOUTME: Confirms the persisted response equals the final cumulative frame

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use chat_relay_server::routes::build_router;
use common::create_test_resources;
use helpers::axum_test::AxumTestRequest;
use helpers::scripted_provider::ScriptedProvider;
use serde_json::json;

#[tokio::test]
async fn test_register_login_chat_and_replay() {
    let resources = create_test_resources(Arc::new(ScriptedProvider::texts(&["H", "He", "Hello"])))
        .await
        .unwrap();
    let app = build_router(Arc::clone(&resources));

    let registered = AxumTestRequest::post("/register")
        .json(&json!({"username": "alice", "password": "pw", "email": "a@x.com"}))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let t1 = registered["data"]["token"].as_str().unwrap().to_owned();
    let user_id = registered["data"]["user"]["id"].as_i64().unwrap();

    let logged_in = AxumTestRequest::post("/login")
        .json(&json!({"username": "alice", "password": "pw"}))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    let t2 = logged_in["data"]["token"].as_str().unwrap().to_owned();

    assert_eq!(resources.auth.verify_token(&t1).await.unwrap().id, user_id);
    assert_eq!(resources.auth.verify_token(&t2).await.unwrap().id, user_id);

    let streamed = AxumTestRequest::post("/chat-process")
        .bearer(&t2)
        .json(&json!({"prompt": "hi", "options": {"conversationId": "c1"}}))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK);

    let body = streamed.text();
    assert_eq!(body.matches('\n').count(), 2);
    let frames = streamed.frames();
    let texts: Vec<&str> = frames.iter().map(|f| f["text"].as_str().unwrap()).collect();
    assert_eq!(texts, ["H", "He", "Hello"]);

    let replay = AxumTestRequest::get("/chat-history/c1")
        .bearer(&t1)
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    let turns = replay["data"].as_array().unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0]["response"], "Hello");
    assert_eq!(turns[0]["conversationId"], "c1");
    assert_eq!(turns[0]["prompt"], "hi");
    assert_eq!(turns[0]["userId"], user_id);
}
