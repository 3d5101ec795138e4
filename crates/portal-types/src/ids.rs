//! String identifiers for portal records.
//!
//! The backend owns id generation; the client only needs opaque strings that
//! are cheap to clone, hash, and embed in query keys.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Creates a new random id (used for client-side drafts and tests).
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Creates an id from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the id is empty or whitespace only.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Identifier of a chat conversation.
    ConversationId
);
string_id!(
    /// Identifier of a chat message.
    MessageId
);
string_id!(
    /// Identifier of a portal post.
    PostId
);
string_id!(
    /// Identifier of a comment on a post.
    CommentId
);
string_id!(
    /// Identifier of a portal user.
    UserId
);
