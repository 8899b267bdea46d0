// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// One betting entry exactly as it arrived on the wire: six strings,
/// unvalidated beyond protocol framing. Field parsing happens when the
/// storage layer converts it into a [`Bet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBet {
    pub agency: String,
    pub first_name: String,
    pub last_name: String,
    pub document: String,
    pub birthdate: String,
    pub number: String,
}

/// A parsed domain bet, as persisted by the store and drawn in the raffle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bet {
    pub agency: i32,
    pub first_name: String,
    pub last_name: String,
    pub document: String,
    pub birthdate: NaiveDate,
    pub number: i32,
}

impl TryFrom<RawBet> for Bet {
    type Error = anyhow::Error;

    fn try_from(raw: RawBet) -> Result<Self> {
        Ok(Self {
            agency: raw.agency.parse().context("agency must be an integer")?,
            birthdate: NaiveDate::parse_from_str(&raw.birthdate, "%Y-%m-%d")
                .context("birthdate must be YYYY-MM-DD")?,
            number: raw.number.parse().context("bet number must be an integer")?,
            first_name: raw.first_name,
            last_name: raw.last_name,
            document: raw.document,
        })
    }
}
