// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};

use crate::{
    models::bet::{Bet, RawBet},
    storage::BetStore,
};

/// Append-only CSV store, one line per bet:
/// `agency,first_name,last_name,document,birthdate,number`.
///
/// A missing file loads as an empty store, so the server starts cleanly on
/// a fresh data directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse_line(line: &str) -> Result<Bet> {
        let mut fields = line.splitn(6, ',');
        let mut next = |name: &'static str| {
            fields
                .next()
                .with_context(|| format!("missing {name} field"))
        };
        Ok(Bet {
            agency: next("agency")?.parse().context("agency must be an integer")?,
            first_name: next("first_name")?.to_string(),
            last_name: next("last_name")?.to_string(),
            document: next("document")?.to_string(),
            birthdate: next("birthdate")?
                .parse()
                .context("birthdate must be YYYY-MM-DD")?,
            number: next("number")?.parse().context("number must be an integer")?,
        })
    }
}

impl BetStore for CsvStore {
    fn store_bets(&mut self, bets: Vec<RawBet>) -> Result<usize> {
        let parsed = bets
            .into_iter()
            .map(Bet::try_from)
            .collect::<Result<Vec<_>>>()?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {:?}", self.path))?;
        for bet in &parsed {
            writeln!(
                file,
                "{},{},{},{},{},{}",
                bet.agency,
                bet.first_name,
                bet.last_name,
                bet.document,
                bet.birthdate.format("%Y-%m-%d"),
                bet.number
            )?;
        }
        file.flush()?;
        Ok(parsed.len())
    }

    fn load_bets(&self) -> Result<Vec<Bet>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            },
            Err(e) => {
                return Err(e).with_context(|| format!("failed to open {:?}", self.path));
            },
        };

        BufReader::new(file)
            .lines()
            .map(|line| {
                let line = line.context("failed to read bets file")?;
                Self::parse_line(&line)
            })
            .collect()
    }
}
