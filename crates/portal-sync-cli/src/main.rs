//! Portal sync - command-line access to conversations, messages, and posts.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portal_config_and_utils::{init_logging, Config, Paths};

/// Portal sync command-line interface.
#[derive(Parser)]
#[command(name = "portal-sync")]
#[command(about = "Read and update portal conversations and posts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config and logs. Defaults to ~/.portal-sync
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Portal API base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Bearer token for the portal API
    #[arg(long, env = "PORTAL_AUTH_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List conversations
    Conversations,
    /// List messages of a conversation
    Messages {
        conversation_id: String,
    },
    /// Send a message
    Send {
        conversation_id: String,
        text: String,
    },
    /// List posts
    Posts,
    /// Show one post with its comments
    Post {
        post_id: String,
    },
    /// Toggle your like on a post
    Like {
        post_id: String,
    },
    /// Comment on a post
    Reply {
        post_id: String,
        text: String,
    },
    /// Delete a comment
    DeleteComment {
        post_id: String,
        comment_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let mut config = Config::load(&paths)?;
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    init_logging(&config.log_level);

    let controller = commands::connect(&config, cli.token)?;
    commands::run(&controller, cli.command).await
}
