//! Controller tests against a scripted backend.
//!
//! - `reads.rs`      - Subscriptions and guarded fetching
//! - `messaging.rs`  - Sending messages and the resulting refetches
//! - `engagement.rs` - Likes, replies, comment deletion, and notices

mod reads;

use portal_types::{ConversationId, PostId};
use query_cache::{CacheConfig, QueryCache};
use remote_resource::{InMemoryTransport, Method, RemoteResource};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::{ConversationSyncController, RecordingNotifier};

pub(crate) const MESSAGES_PATH: &str = "/conversations/c1/messages";

/// Controller wired to an in-memory backend holding conversation `c1` and post `p1`.
pub(crate) struct Harness {
    pub controller: ConversationSyncController,
    pub transport: Arc<InMemoryTransport>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        let transport = Arc::new(InMemoryTransport::new());
        let messages = Arc::new(Mutex::new(vec![message("m1", "welcome")]));

        let state = messages.clone();
        transport.respond_with(Method::Get, MESSAGES_PATH, move |_| {
            Ok(Value::Array(state.lock().unwrap().clone()))
        });

        let state = messages.clone();
        transport.respond_with(Method::Get, "/conversations", move |_| {
            let messages = state.lock().unwrap();
            let preview = messages.last().map(|m| m["text"].clone());
            Ok(json!([{
                "id": "c1",
                "participants": ["u1", "u2"],
                "lastMessagePreview": preview,
                "updatedAt": "2024-05-01T10:00:00Z"
            }]))
        });

        let state = messages;
        transport.respond_with(Method::Post, MESSAGES_PATH, move |request| {
            let mut messages = state.lock().unwrap();
            let text = request.body.as_ref().map(|b| b["text"].clone());
            let created = message(
                &format!("m{}", messages.len() + 1),
                text.as_ref().and_then(Value::as_str).unwrap_or_default(),
            );
            messages.push(created.clone());
            Ok(created)
        });

        transport.respond(Method::Get, "/posts", json!([post_json(3, false)]));
        transport.respond(Method::Get, "/posts/p1", post_json(3, false));

        let notifier = Arc::new(RecordingNotifier::new());
        let cache = QueryCache::in_current_runtime(CacheConfig::default());
        let controller = ConversationSyncController::new(
            RemoteResource::new(transport.clone()),
            cache,
            notifier.clone(),
        );

        Self {
            controller,
            transport,
            notifier,
        }
    }
}

pub(crate) fn message(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "conversationId": "c1",
        "senderId": "u1",
        "text": text,
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

pub(crate) fn post_json(like_count: u32, liked_by_me: bool) -> Value {
    json!({
        "id": "p1",
        "authorId": "u2",
        "title": "Exam schedule",
        "body": "Finals start on the 12th.",
        "likeCount": like_count,
        "likedByMe": liked_by_me,
        "comments": [{
            "id": "k1",
            "postId": "p1",
            "authorId": "u1",
            "text": "Thanks!",
            "createdAt": "2024-05-01T11:00:00Z"
        }],
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

pub(crate) fn c1() -> ConversationId {
    ConversationId::from_string("c1")
}

pub(crate) fn p1() -> PostId {
    PostId::from_string("p1")
}
