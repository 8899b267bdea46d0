// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::{Context, Result};
use lottery_server_rs::{
    cfg::{cli::resolve_config_path, config::Config, logger::init_logger},
    raffle::coordinator::Coordinator,
    server::acceptor::Server,
    storage::{self, csv::CsvStore},
};
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _logger_guard = init_logger("config/logger.yaml")?;

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.yaml".to_string());
    let cfg = resolve_config_path(&config_path)
        .and_then(Config::load_from_file)
        .context("failed to resolve or load config")?;

    let store = storage::shared(CsvStore::new(cfg.storage.bets_file.clone()));
    let coordinator = Arc::new(Coordinator::new(
        cfg.server.clients_amount as usize,
        Arc::clone(&store),
    ));

    let cancel = CancellationToken::new();
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            sigterm.recv().await;
            info!("SIGTERM received, shutting down");
            cancel.cancel();
        });
    }

    let server = Server::bind(&cfg, store, coordinator, cancel)?;
    info!("listening on port {}", cfg.server.port);
    server.run().await
}
