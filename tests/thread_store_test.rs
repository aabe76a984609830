// ABOUTME: Integration tests for chat history persistence
// ABOUTME: Covers listing order, ownership-scoped deletes, and integrity failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chat_relay_server::database::{Database, ThreadStore};
use chat_relay_server::errors::{ErrorCode, ErrorKind};
use chat_relay_server::models::NewChatTurn;
use common::create_test_database;

async fn setup() -> (Database, ThreadStore, i64, i64) {
    let database = create_test_database().await.unwrap();
    let users = database.users();
    let alice = users.create_user("alice", "a@x.com", "hash").await.unwrap();
    let bob = users.create_user("bob", "b@x.com", "hash").await.unwrap();
    let threads = database.threads();
    (database, threads, alice.id, bob.id)
}

fn turn(user_id: i64, conversation_id: &str, prompt: &str) -> NewChatTurn {
    NewChatTurn {
        user_id,
        conversation_id: Some(conversation_id.to_owned()),
        prompt: prompt.to_owned(),
        response: format!("re: {prompt}"),
        ..NewChatTurn::default()
    }
}

#[tokio::test]
async fn test_save_returns_stored_turn() {
    let (_db, threads, alice, _bob) = setup().await;

    let stored = threads
        .save(NewChatTurn {
            user_id: alice,
            conversation_id: Some("c1".to_owned()),
            parent_message_id: Some("p0".to_owned()),
            prompt: "hi".to_owned(),
            response: "Hello".to_owned(),
            system_message: Some("be brief".to_owned()),
            temperature: Some(0.8),
            top_p: Some(1.0),
        })
        .await
        .unwrap();

    assert!(stored.id > 0);
    assert!(!stored.created_at.is_empty());

    let listed = threads.get_history(alice).await.unwrap();
    assert_eq!(listed.len(), 1);
    let row = &listed[0];
    assert_eq!(row.id, stored.id);
    assert_eq!(row.response, "Hello");
    assert_eq!(row.parent_message_id.as_deref(), Some("p0"));
    assert_eq!(row.system_message.as_deref(), Some("be brief"));
    assert_eq!(row.temperature, Some(0.8));
    assert_eq!(row.top_p, Some(1.0));
    assert_eq!(row.created_at, stored.created_at);
}

#[tokio::test]
async fn test_parent_message_id_is_not_validated() {
    let (_db, threads, alice, _bob) = setup().await;

    let stored = threads
        .save(NewChatTurn {
            parent_message_id: Some("does-not-exist".to_owned()),
            ..turn(alice, "c1", "hi")
        })
        .await
        .unwrap();
    assert_eq!(stored.parent_message_id.as_deref(), Some("does-not-exist"));
}

#[tokio::test]
async fn test_history_and_conversation_orders_are_opposite() {
    let (_db, threads, alice, _bob) = setup().await;

    for prompt in ["first", "second", "third"] {
        threads.save(turn(alice, "c1", prompt)).await.unwrap();
    }

    let replay: Vec<String> = threads
        .get_by_conversation(alice, "c1")
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.prompt)
        .collect();
    assert_eq!(replay, ["first", "second", "third"]);

    let listing: Vec<String> = threads
        .get_history(alice)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.prompt)
        .collect();
    assert_eq!(listing, ["third", "second", "first"]);
}

#[tokio::test]
async fn test_reads_are_scoped_to_owner() {
    let (_db, threads, alice, bob) = setup().await;

    threads.save(turn(alice, "c1", "alice-1")).await.unwrap();
    threads.save(turn(bob, "c1", "bob-1")).await.unwrap();
    threads.save(turn(alice, "c2", "alice-2")).await.unwrap();

    assert_eq!(threads.get_history(alice).await.unwrap().len(), 2);
    assert_eq!(threads.get_history(bob).await.unwrap().len(), 1);

    let c1 = threads.get_by_conversation(alice, "c1").await.unwrap();
    assert_eq!(c1.len(), 1);
    assert_eq!(c1[0].prompt, "alice-1");

    assert!(threads.get_by_conversation(alice, "nope").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_of_foreign_turn_is_silent_no_op() {
    let (_db, threads, alice, bob) = setup().await;
    let stored = threads.save(turn(alice, "c1", "keep me")).await.unwrap();

    threads.delete(bob, stored.id).await.unwrap();

    let history = threads.get_history(alice).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, stored.id);
}

#[tokio::test]
async fn test_delete_of_unknown_turn_succeeds() {
    let (_db, threads, alice, _bob) = setup().await;
    threads.delete(alice, 9_999).await.unwrap();
}

#[tokio::test]
async fn test_delete_removes_only_that_turn() {
    let (_db, threads, alice, _bob) = setup().await;
    let first = threads.save(turn(alice, "c1", "first")).await.unwrap();
    let second = threads.save(turn(alice, "c1", "second")).await.unwrap();

    threads.delete(alice, first.id).await.unwrap();

    let remaining = threads.get_history(alice).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);
}

#[tokio::test]
async fn test_delete_conversation_is_owner_scoped() {
    let (_db, threads, alice, bob) = setup().await;
    threads.save(turn(alice, "c1", "a")).await.unwrap();
    threads.save(turn(alice, "c1", "b")).await.unwrap();
    threads.save(turn(alice, "c2", "c")).await.unwrap();
    threads.save(turn(bob, "c1", "d")).await.unwrap();

    assert_eq!(threads.delete_conversation(alice, "c1").await.unwrap(), 2);
    assert_eq!(threads.delete_conversation(alice, "c1").await.unwrap(), 0);

    assert_eq!(threads.get_history(alice).await.unwrap().len(), 1);
    assert_eq!(threads.get_by_conversation(bob, "c1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_save_for_unknown_user_is_constraint_violation() {
    let (_db, threads, _alice, _bob) = setup().await;

    let error = threads.save(turn(424_242, "c1", "orphan")).await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ConstraintViolation);
    assert_eq!(error.kind(), ErrorKind::Persistence);
}
