//! Records owned by the query cache.
//!
//! Field names follow the backend's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CommentId, ConversationId, MessageId, PostId, UserId};

/// A chat conversation, as listed under `["conversations"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    #[serde(default)]
    pub participants: Vec<UserId>,
    #[serde(default)]
    pub last_message_preview: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// A chat message, as listed under `["messages", conversationId]`.
///
/// The server orders messages; the client never reorders them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A portal post with its engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub liked_by_me: bool,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

/// Server answer to a like/dislike toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub post_id: PostId,
    pub liked: bool,
    pub like_count: u64,
}
