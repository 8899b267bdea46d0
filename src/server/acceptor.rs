// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tokio::{
    net::{TcpListener, TcpSocket},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    cfg::config::Config,
    raffle::coordinator::Coordinator,
    session::handler::SessionCtx,
    storage::SharedStore,
};

/// Accept loop: one session task per connection, cooperative shutdown on
/// the cancellation token (wired to SIGTERM by `main`).
pub struct Server {
    listener: TcpListener,
    store: SharedStore,
    coordinator: Arc<Coordinator>,
    cancel: CancellationToken,
}

impl Server {
    /// Binds the listening socket with the configured backlog.
    pub fn bind(
        cfg: &Config,
        store: SharedStore,
        coordinator: Arc<Coordinator>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let addr: SocketAddr = format!("0.0.0.0:{}", cfg.server.port)
            .parse()
            .context("invalid listen address")?;

        let socket = TcpSocket::new_v4().context("failed to create listening socket")?;
        socket
            .set_reuseaddr(true)
            .context("failed to set SO_REUSEADDR")?;
        socket
            .bind(addr)
            .with_context(|| format!("failed to bind {addr}"))?;
        let listener = socket
            .listen(cfg.server.listen_backlog)
            .context("failed to listen")?;

        Ok(Self { listener, store, coordinator, cancel })
    }

    /// The actual bound address; useful when the configured port is 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts until the shutdown token fires, then stops listening and
    /// drains in-flight sessions before returning.
    pub async fn run(self) -> Result<()> {
        let mut sessions = JoinSet::new();

        loop {
            info!(action = "accept_connections", result = "in_progress");
            let accepted = tokio::select! {
                _ = self.cancel.cancelled() => break,
                accepted = self.listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    info!(
                        action = "accept_connections",
                        result = "success",
                        ip = %peer.ip()
                    );
                    let ctx = SessionCtx::new(
                        stream,
                        peer,
                        Arc::clone(&self.store),
                        Arc::clone(&self.coordinator),
                        self.cancel.child_token(),
                    );
                    sessions.spawn(async move {
                        if let Err(e) = ctx.run().await {
                            debug!("session closed: {e:#}");
                        }
                    });
                },
                Err(e) => {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    warn!(action = "accept_connections", result = "fail", error = %e);
                },
            }
        }

        // Stop accepting before draining: new connections are refused while
        // in-flight sessions run to completion.
        drop(self.listener);
        while sessions.join_next().await.is_some() {}
        Ok(())
    }
}
