//! Process bootstrap: logging, config, adapters, then the relay loop.
//!
//! Exits non-zero when either adapter fails to start or a network rejects
//! our credentials mid-run; otherwise runs until an event stream closes.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use bifrost_core::config::BifrostConfig;
use bifrost_irc::IrcAdapter;
use bifrost_relay::{ChannelMap, Directory, EmojiTable, RelayEngine, Transformer};
use bifrost_slack::{SlackAdapter, SlackDirectory};

/// Slack ↔ IRC channel bridge.
#[derive(Debug, Parser)]
#[command(name = "bifrost", version)]
struct Args {
    /// Path to bifrost.toml (BIFROST_* env vars override file values).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bifrost=info".into()),
        )
        .init();

    let args = Args::parse();
    let config = BifrostConfig::load(args.config.as_deref())?;

    let map = ChannelMap::from_pairs(&config.bridges)?;
    info!(bridges = config.bridges.len(), "channel map built");

    let emoji = EmojiTable::load(&config.emoji_file)?;
    info!(path = %config.emoji_file, shortcodes = emoji.len(), "emoji table loaded");

    let slack = SlackAdapter::new(&config.slack);
    let directory: Arc<dyn Directory> = Arc::new(SlackDirectory::new(slack.client()));
    let irc = IrcAdapter::new(&config.irc, map.irc_channels());

    let engine = RelayEngine::new(
        Box::new(irc),
        Box::new(slack),
        map,
        Arc::clone(&directory),
        Transformer::slack_to_irc(directory, emoji, bifrost_irc::format::sender_name),
        Transformer::irc_to_slack(),
    );
    engine.run().await?;
    Ok(())
}
