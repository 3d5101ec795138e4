//! Shared types for the portal sync layer.
//!
//! Every other crate in the workspace speaks in these types:
//!
//! - [`ids`] - String identifiers for conversations, messages, posts, comments, users
//! - [`key`] - [`QueryKey`], the identity of a cached remote result
//! - [`models`] - Records owned by the cache (conversations, messages, posts)
//! - [`mutation`] - State-changing requests and their validation
//! - [`error`] - Transport, validation, and sync error taxonomy

mod error;
pub mod ids;
pub mod key;
pub mod models;
pub mod mutation;

pub use error::{SyncError, SyncResult, TransportError, TransportErrorKind, ValidationError};
pub use ids::{CommentId, ConversationId, MessageId, PostId, UserId};
pub use key::{KeyPart, QueryKey};
pub use models::{Comment, Conversation, LikeToggle, Message, Post};
pub use mutation::{MutationKind, MutationRequest, SendMessagePayload, MAX_TEXT_CHARS};
