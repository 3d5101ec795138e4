//! Cache keys for the portal's remote resources.

use portal_types::{ConversationId, PostId, QueryKey};

pub const CONVERSATIONS: &str = "conversations";
pub const MESSAGES: &str = "messages";
pub const POSTS: &str = "posts";
pub const POST: &str = "post";

/// `["conversations"]`
pub fn conversations() -> QueryKey {
    QueryKey::root(CONVERSATIONS)
}

/// `["messages", id]`
pub fn messages(conversation_id: &ConversationId) -> QueryKey {
    QueryKey::root(MESSAGES).with(conversation_id.as_str())
}

/// `["posts"]`
pub fn posts() -> QueryKey {
    QueryKey::root(POSTS)
}

/// `["post", id]`
pub fn post(post_id: &PostId) -> QueryKey {
    QueryKey::root(POST).with(post_id.as_str())
}
