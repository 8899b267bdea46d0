// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

/// Top-level server configuration, loaded from YAML.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(rename = "Port")]
    /// TCP port the acceptor binds on all interfaces.
    pub port: u16,

    #[serde(rename = "ListenBacklog")]
    /// Accept backlog handed to `listen(2)`.
    pub listen_backlog: u32,

    #[serde(rename = "ClientsAmount")]
    /// Number of agencies expected to declare completion before the raffle
    /// runs.
    pub clients_amount: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StorageConfig {
    #[serde(rename = "BetsFile")]
    /// Where the CSV store appends persisted bets.
    pub bets_file: PathBuf,
}

impl Config {
    /// Loads the configuration from YAML, validates it, and returns the
    /// ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.server.port != 0, "Port must not be 0");
        ensure!(self.server.listen_backlog >= 1, "ListenBacklog must be >= 1");
        ensure!(self.server.clients_amount >= 1, "ClientsAmount must be >= 1");
        Ok(())
    }
}
