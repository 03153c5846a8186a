mod catalog;
mod commands;
mod handler;
mod joke;
mod resolver;
mod session;

use std::env;

use anyhow::Context as _;
use clap::Parser;
use serenity::prelude::*;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::catalog::LookupTables;
use crate::handler::Handler;

#[derive(Parser)]
struct Args {
    /// Path to a JSON file replacing the builtin catalog of name/URL objects
    #[clap(long)]
    objects_path: Option<String>,

    /// Path to a JSON file replacing the builtin option groups
    #[clap(long)]
    options_path: Option<String>,

    /// Seconds a choice prompt stays clickable before its options are disabled
    #[clap(long, default_value_t = 30)]
    choice_timeout: u64,

    /// Register commands in this guild only instead of globally. Guild commands propagate instantly, which helps during development.
    #[clap(long)]
    guild_id: Option<u64>,

    /// Reply to plain channel messages that mention a known object name
    #[clap(long)]
    scan_messages: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snailbot=debug,serenity=warn,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = Args::parse();
    if let Ok(env_timeout) = std::env::var("CHOICE_TIMEOUT") {
        if let Ok(val) = env_timeout.parse::<u64>() {
            args.choice_timeout = val;
        }
    }

    let entries = match &args.objects_path {
        Some(path) => catalog::load_catalog(path)?,
        None => catalog::builtin_catalog(),
    };
    let groups = match &args.options_path {
        Some(path) => catalog::load_groups(path)?,
        None => catalog::builtin_groups(),
    };
    let tables = LookupTables::new(entries, groups);

    info!("Catalog entries: {}", tables.catalog().len());
    info!("Option groups: {}", tables.groups().len());
    info!("Choice timeout: {}s", args.choice_timeout);
    if args.scan_messages {
        info!("Passive message scan enabled");
    }

    // Interactions only need GUILDS; the passive scan also reads messages.
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler::new(tables, args.choice_timeout, args.guild_id, args.scan_messages);

    let token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN environment variable is unset")?;
    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await
        .context("failed to create Discord client")?;

    let client_handle = tokio::spawn(async move {
        if let Err(why) = client.start().await {
            error!("Client error: {}", why);
        }
    });

    signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");
    client_handle.abort();
    Ok(())
}
