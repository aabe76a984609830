// ABOUTME: Server binary for the chat relay
// ABOUTME: Loads configuration, opens storage and the upstream client, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Chat Relay Server Binary

use std::sync::Arc;

use anyhow::Result;
use chat_relay_server::{config::ServerConfig, logging, resources::ServerResources, server};
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "chat-relay-server")]
#[command(about = "Chat relay - streams LLM completions and keeps per-user history")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(url) = args.database_url.as_deref() {
        config.database.url = chat_relay_server::config::DatabaseUrl::parse_url(url);
    }

    info!("Starting chat relay server");
    info!("{}", config.summary());

    let resources = Arc::new(ServerResources::from_config(config).await?);

    if let Err(e) = server::run(resources).await {
        error!("Server error: {e}");
        return Err(e.into());
    }

    Ok(())
}
