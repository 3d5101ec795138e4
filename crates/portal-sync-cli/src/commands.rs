//! Command execution.

use anyhow::{bail, Context};
use conversation_sync::{ConversationSyncController, TracingNotifier};
use portal_config_and_utils::Config;
use portal_types::{CommentId, ConversationId, PostId, SendMessagePayload};
use query_cache::{QueryCache, Subscription};
use remote_resource::{HttpTransport, HttpTransportConfig, RemoteResource};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::Commands;

/// Builds the controller over the HTTP transport.
pub fn connect(config: &Config, token: Option<String>) -> anyhow::Result<ConversationSyncController> {
    let base_url = config.api_base_url().context("invalid api_base_url")?;
    let transport = HttpTransport::new(HttpTransportConfig {
        base_url: base_url.to_string(),
        timeout_secs: config.request_timeout_secs,
        auth_token: token,
    })?;

    info!(api = %base_url, "Connecting to portal API");

    let cache = QueryCache::in_current_runtime(config.cache_config());
    Ok(ConversationSyncController::new(
        RemoteResource::new(Arc::new(transport)),
        cache,
        Arc::new(TracingNotifier),
    ))
}

pub async fn run(controller: &ConversationSyncController, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Conversations => print_settled(controller.list_conversations()).await,
        Commands::Messages { conversation_id } => {
            let Some(messages) =
                controller.list_messages(&ConversationId::from_string(conversation_id))
            else {
                bail!("conversation id must not be empty");
            };
            print_settled(messages).await
        }
        Commands::Send {
            conversation_id,
            text,
        } => {
            let message = controller
                .send_message(SendMessagePayload::new(conversation_id, text))
                .await?;
            print_json(&message)
        }
        Commands::Posts => print_settled(controller.list_posts()).await,
        Commands::Post { post_id } => {
            let Some(post) = controller.post(&PostId::from_string(post_id)) else {
                bail!("post id must not be empty");
            };
            print_settled(post).await
        }
        Commands::Like { post_id } => {
            let toggle = controller
                .like_dislike(&PostId::from_string(post_id))
                .await?;
            print_json(&toggle)
        }
        Commands::Reply { post_id, text } => {
            let comment = controller
                .reply(&PostId::from_string(post_id), text)
                .await?;
            print_json(&comment)
        }
        Commands::DeleteComment {
            post_id,
            comment_id,
        } => {
            controller
                .delete_comment(
                    &PostId::from_string(post_id),
                    &CommentId::from_string(comment_id),
                )
                .await?;
            Ok(())
        }
    }
}

/// Waits for the subscription's fetch and prints the result.
async fn print_settled<T>(mut subscription: Subscription<T>) -> anyhow::Result<()>
where
    T: Serialize + Send + Sync + 'static,
{
    let snapshot = subscription.settled().await;
    if let Some(error) = snapshot.error {
        return Err(anyhow::Error::new(error).context(format!("failed to load {}", snapshot.key)));
    }
    let data = snapshot
        .data
        .with_context(|| format!("no data for {}", snapshot.key))?;
    print_json(data.as_ref())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
