//! Subscriptions and guarded fetching.

use portal_types::ConversationId;
use std::sync::Arc;

use super::*;
use crate::keys;

#[tokio::test]
async fn conversations_load_into_cache() {
    let h = Harness::new();

    let mut conversations = h.controller.list_conversations();
    assert!(conversations.initial().is_loading());

    let settled = conversations.settled().await;
    let list = settled.data().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].last_message_preview.as_deref(), Some("welcome"));
    assert!(h.controller.cache().contains(&keys::conversations()));
}

#[tokio::test]
async fn blank_conversation_id_never_fetches() {
    let h = Harness::new();

    assert!(h.controller.list_messages(&ConversationId::from_string("")).is_none());
    assert!(h.controller.list_messages(&ConversationId::from_string("   ")).is_none());
    assert!(!h.controller.refetch_messages(&ConversationId::from_string("")));

    tokio::task::yield_now().await;
    assert!(h.transport.calls().is_empty());
    assert!(h.controller.cache().is_empty());
}

#[tokio::test]
async fn overlapping_message_views_share_one_result() {
    let h = Harness::new();

    let mut first = h.controller.list_messages(&c1()).unwrap();
    let mut second = h.controller.list_messages(&c1()).unwrap();

    let a = first.settled().await;
    let b = second.settled().await;
    assert!(Arc::ptr_eq(a.data.as_ref().unwrap(), b.data.as_ref().unwrap()));
    assert_eq!(h.transport.call_count(Method::Get, MESSAGES_PATH), 1);
}

#[tokio::test]
async fn refetch_on_demand() {
    let h = Harness::new();
    assert!(!h.controller.refetch_conversations());

    let mut conversations = h.controller.list_conversations();
    conversations.settled().await;

    assert!(h.controller.refetch_conversations());
    conversations.settled().await;
    assert_eq!(h.transport.call_count(Method::Get, "/conversations"), 2);
}

#[tokio::test]
async fn rapid_refetches_reach_the_backend_once() {
    let h = Harness::new();

    let mut messages = h.controller.list_messages(&c1()).unwrap();
    assert!(h.controller.refetch_messages(&c1()));
    assert!(h.controller.refetch_messages(&c1()));

    let settled = messages.settled().await;
    assert_eq!(settled.generation, 3);
    assert_eq!(settled.data().unwrap().len(), 1);
    assert_eq!(h.transport.call_count(Method::Get, MESSAGES_PATH), 1);
}

#[tokio::test]
async fn posts_and_single_post() {
    let h = Harness::new();

    let mut feed = h.controller.list_posts();
    let mut post = h.controller.post(&p1()).unwrap();
    assert!(h.controller.post(&portal_types::PostId::from_string("")).is_none());

    let feed = feed.settled().await;
    assert_eq!(feed.data().unwrap()[0].title, "Exam schedule");

    let post = post.settled().await;
    let post = post.data().unwrap();
    assert_eq!(post.like_count, 3);
    assert_eq!(post.comments[0].id.as_str(), "k1");
}

#[tokio::test]
async fn fetch_error_is_observable_not_thrown() {
    let h = Harness::new();
    h.transport.fail(
        Method::Get,
        "/conversations/c2/messages",
        portal_types::TransportError::http(403, "not a participant"),
    );

    let mut messages = h
        .controller
        .list_messages(&ConversationId::from_string("c2"))
        .unwrap();
    let failed = messages.settled().await;
    assert!(failed.is_error());
    assert_eq!(failed.error.unwrap().status(), Some(403));
}
