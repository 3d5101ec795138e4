//! Mapping from query keys and mutation requests to backend paths.
//!
//! | Key / request | Method | Path |
//! |---------------|--------|------|
//! | `["conversations"]` | GET | `/conversations` |
//! | `["messages", id]` | GET | `/conversations/{id}/messages` |
//! | `["posts"]` | GET | `/posts` |
//! | `["post", id]` | GET | `/posts/{id}` |
//! | SendMessage | POST | `/conversations/{id}/messages` |
//! | LikeDislike | POST | `/posts/{id}/like` |
//! | Reply | POST | `/posts/{id}/comments` |
//! | DeleteComment | DELETE | `/posts/{id}/comments/{commentId}` |

use portal_types::{MutationRequest, QueryKey, TransportError};
use serde_json::json;

use crate::transport::TransportRequest;

pub const CONVERSATIONS: &str = "conversations";
pub const MESSAGES: &str = "messages";
pub const POSTS: &str = "posts";
pub const POST: &str = "post";

/// Resolves the GET request that loads `key`.
///
/// Unknown or malformed keys fail without touching the network.
pub fn query_request(key: &QueryKey) -> Result<TransportRequest, TransportError> {
    let path = match (key.resource(), key.len()) {
        (Some(CONVERSATIONS), 1) => "/conversations".to_string(),
        (Some(MESSAGES), 2) => {
            let conversation_id = segment(key, 1)?;
            format!("/conversations/{conversation_id}/messages")
        }
        (Some(POSTS), 1) => "/posts".to_string(),
        (Some(POST), 2) => {
            let post_id = segment(key, 1)?;
            format!("/posts/{post_id}")
        }
        _ => return Err(no_route(key)),
    };
    Ok(TransportRequest::get(path))
}

/// Resolves the request that performs `request`.
pub fn mutation_request(request: &MutationRequest) -> TransportRequest {
    match request {
        MutationRequest::SendMessage(payload) => TransportRequest::post(
            format!(
                "/conversations/{}/messages",
                urlencoding::encode(payload.conversation_id.as_str())
            ),
            Some(json!({ "text": payload.text })),
        ),
        MutationRequest::LikeDislike { post_id } => TransportRequest::post(
            format!("/posts/{}/like", urlencoding::encode(post_id.as_str())),
            None,
        ),
        MutationRequest::Reply { post_id, text } => TransportRequest::post(
            format!("/posts/{}/comments", urlencoding::encode(post_id.as_str())),
            Some(json!({ "text": text })),
        ),
        MutationRequest::DeleteComment {
            post_id,
            comment_id,
        } => TransportRequest::delete(format!(
            "/posts/{}/comments/{}",
            urlencoding::encode(post_id.as_str()),
            urlencoding::encode(comment_id.as_str())
        )),
    }
}

fn segment(key: &QueryKey, index: usize) -> Result<String, TransportError> {
    match key.str_at(index) {
        Some(value) if !value.trim().is_empty() => Ok(urlencoding::encode(value).into_owned()),
        _ => Err(no_route(key)),
    }
}

fn no_route(key: &QueryKey) -> TransportError {
    TransportError::unroutable(format!("no route for query key {key}"))
}
