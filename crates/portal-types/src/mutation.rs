//! State-changing requests.
//!
//! A [`MutationRequest`] is created per call and never persisted. Validation
//! runs before any transport call so malformed payloads never leave the client.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::{CommentId, ConversationId, PostId};

/// Maximum characters accepted in a message or reply body.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Payload of a new chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub conversation_id: ConversationId,
    pub text: String,
}

impl SendMessagePayload {
    /// Creates a payload for `conversation_id`.
    pub fn new(conversation_id: impl Into<ConversationId>, text: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            text: text.into(),
        }
    }
}

/// Discriminant of a [`MutationRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    SendMessage,
    LikeDislike,
    Reply,
    DeleteComment,
}

impl MutationKind {
    /// Stable name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::SendMessage => "send_message",
            MutationKind::LikeDislike => "like_dislike",
            MutationKind::Reply => "reply",
            MutationKind::DeleteComment => "delete_comment",
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A state-changing request against the remote source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRequest {
    /// Append a message to a conversation.
    SendMessage(SendMessagePayload),
    /// Toggle the current user's like on a post.
    LikeDislike { post_id: PostId },
    /// Add a comment to a post.
    Reply { post_id: PostId, text: String },
    /// Remove a comment from a post.
    DeleteComment {
        post_id: PostId,
        comment_id: CommentId,
    },
}

impl MutationRequest {
    /// Returns the request kind.
    pub fn kind(&self) -> MutationKind {
        match self {
            MutationRequest::SendMessage(_) => MutationKind::SendMessage,
            MutationRequest::LikeDislike { .. } => MutationKind::LikeDislike,
            MutationRequest::Reply { .. } => MutationKind::Reply,
            MutationRequest::DeleteComment { .. } => MutationKind::DeleteComment,
        }
    }

    /// Checks the payload shape before any transport call.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            MutationRequest::SendMessage(payload) => {
                require_id("conversationId", payload.conversation_id.as_str())?;
                require_text(&payload.text)
            }
            MutationRequest::LikeDislike { post_id } => require_id("postId", post_id.as_str()),
            MutationRequest::Reply { post_id, text } => {
                require_id("postId", post_id.as_str())?;
                require_text(text)
            }
            MutationRequest::DeleteComment {
                post_id,
                comment_id,
            } => {
                require_id("postId", post_id.as_str())?;
                require_id("commentId", comment_id.as_str())
            }
        }
    }
}

fn require_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

fn require_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyField { field: "text" });
    }
    let chars = text.chars().count();
    if chars > MAX_TEXT_CHARS {
        return Err(ValidationError::TextTooLong {
            max: MAX_TEXT_CHARS,
            actual: chars,
        });
    }
    Ok(())
}
