//! Controller over conversations, messages, and post engagement.

use mutation_executor::{MutationExecutor, MutationHooks, MutationOptions};
use portal_types::{
    Comment, CommentId, Conversation, ConversationId, LikeToggle, Message, MutationRequest, Post,
    PostId, QueryKey, SendMessagePayload, SyncError, SyncResult,
};
use query_cache::{QueryCache, Subscription};
use remote_resource::RemoteResource;
use serde::de::{DeserializeOwned, IgnoredAny};
use std::sync::Arc;
use tracing::debug;

use crate::keys;
use crate::notifier::Notifier;

/// Reports an engagement mutation's outcome to the user.
struct NoticeHooks<R> {
    notifier: Arc<dyn Notifier>,
    describe: fn(&R) -> String,
}

impl<R> MutationHooks<R> for NoticeHooks<R> {
    fn on_success(&self, result: &R) {
        self.notifier.notify_success(&(self.describe)(result));
    }

    fn on_error(&self, error: &SyncError) {
        self.notifier.notify_error(&error.to_string());
    }
}

/// Entry point for conversation and engagement screens.
///
/// Reads are cache subscriptions; writes go through the mutation executor
/// and invalidate the keys whose server state they change.
#[derive(Clone)]
pub struct ConversationSyncController {
    resource: RemoteResource,
    cache: QueryCache,
    executor: MutationExecutor,
    notifier: Arc<dyn Notifier>,
}

impl ConversationSyncController {
    pub fn new(resource: RemoteResource, cache: QueryCache, notifier: Arc<dyn Notifier>) -> Self {
        let executor = MutationExecutor::new(resource.clone(), cache.clone());
        Self {
            resource,
            cache,
            executor,
            notifier,
        }
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn executor(&self) -> &MutationExecutor {
        &self.executor
    }

    fn subscribe<T>(&self, key: QueryKey) -> Subscription<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let resource = self.resource.clone();
        self.cache.subscribe(key, move |key| {
            let resource = resource.clone();
            async move { resource.fetch::<T>(&key).await.map_err(SyncError::from) }
        })
    }

    /// The current user's conversations.
    pub fn list_conversations(&self) -> Subscription<Vec<Conversation>> {
        self.subscribe(keys::conversations())
    }

    /// Messages of one conversation, oldest first.
    ///
    /// Returns `None` for a blank id; nothing is fetched or cached then.
    pub fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Option<Subscription<Vec<Message>>> {
        if conversation_id.is_blank() {
            debug!("Skipping message fetch without a conversation");
            return None;
        }
        Some(self.subscribe(keys::messages(conversation_id)))
    }

    /// The engagement feed.
    pub fn list_posts(&self) -> Subscription<Vec<Post>> {
        self.subscribe(keys::posts())
    }

    /// One post with its comments. `None` for a blank id.
    pub fn post(&self, post_id: &PostId) -> Option<Subscription<Post>> {
        if post_id.is_blank() {
            return None;
        }
        Some(self.subscribe(keys::post(post_id)))
    }

    pub fn refetch_conversations(&self) -> bool {
        self.cache.refetch(&keys::conversations())
    }

    pub fn refetch_messages(&self, conversation_id: &ConversationId) -> bool {
        if conversation_id.is_blank() {
            return false;
        }
        self.cache.refetch(&keys::messages(conversation_id))
    }

    /// Appends a message to a conversation.
    ///
    /// On success the conversation's messages and the conversation list are
    /// invalidated. Failures are returned to the caller.
    pub async fn send_message(&self, payload: SendMessagePayload) -> SyncResult<Message> {
        let options = MutationOptions::new()
            .invalidate(keys::messages(&payload.conversation_id))
            .invalidate(keys::conversations());
        self.executor
            .run(MutationRequest::SendMessage(payload), options)
            .await
    }

    /// Toggles the current user's like on a post.
    pub async fn like_dislike(&self, post_id: &PostId) -> SyncResult<LikeToggle> {
        let request = MutationRequest::LikeDislike {
            post_id: post_id.clone(),
        };
        self.engage::<LikeToggle>(request, post_id, |toggle| {
            if toggle.liked {
                "Post liked".to_string()
            } else {
                "Like removed".to_string()
            }
        })
        .await
    }

    /// Adds a comment to a post.
    pub async fn reply(&self, post_id: &PostId, text: impl Into<String>) -> SyncResult<Comment> {
        let request = MutationRequest::Reply {
            post_id: post_id.clone(),
            text: text.into(),
        };
        self.engage::<Comment>(request, post_id, |_| "Reply posted".to_string())
            .await
    }

    /// Removes a comment from a post.
    pub async fn delete_comment(&self, post_id: &PostId, comment_id: &CommentId) -> SyncResult<()> {
        let request = MutationRequest::DeleteComment {
            post_id: post_id.clone(),
            comment_id: comment_id.clone(),
        };
        self.engage::<IgnoredAny>(request, post_id, |_| "Comment deleted".to_string())
            .await
            .map(|_| ())
    }

    /// Runs an engagement mutation: invalidates the post and the feed on
    /// success and tells the user either way.
    async fn engage<R>(
        &self,
        request: MutationRequest,
        post_id: &PostId,
        describe: fn(&R) -> String,
    ) -> SyncResult<R>
    where
        R: DeserializeOwned + 'static,
    {
        let hooks = Arc::new(NoticeHooks {
            notifier: Arc::clone(&self.notifier),
            describe,
        });
        let options = MutationOptions::new()
            .invalidate(keys::post(post_id))
            .invalidate(keys::posts())
            .with_hooks(hooks);
        self.executor.run(request, options).await
    }
}
