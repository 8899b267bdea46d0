// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::HashMap;

use tokio::io::AsyncRead;

use crate::{
    codec::recv::FrameReader,
    models::{bet::RawBet, error::ProtocolError},
};

/// Keys every bet on the wire must carry, in the canonical field order.
const REQUIRED_KEYS: [&str; 6] = [
    "AGENCIA",
    "NOMBRE",
    "APELLIDO",
    "DOCUMENTO",
    "NACIMIENTO",
    "NUMERO",
];

/// A NEW_BETS batch decoded from one frame.
///
/// Body layout: `[n_bets:i32]` followed by `n_bets` bets, each
/// `[n_pairs:i32 == 6][6 × (key:string, value:string)]`.
#[derive(Debug, Default)]
pub struct NewBets {
    /// Batch size as announced on the wire.
    pub amount: i32,
    pub bets: Vec<RawBet>,
}

impl NewBets {
    /// Decodes the body of a NEW_BETS frame against a `remaining` counter
    /// initialized to the announced body length.
    ///
    /// If the body is malformed, any announced bytes still on the stream are
    /// consumed before the error is returned, so a subsequent message on the
    /// same connection stays frame-aligned.
    pub async fn read_from<R>(
        reader: &mut FrameReader<R>,
        length: i32,
    ) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let mut remaining = length;
        match Self::decode_body(reader, &mut remaining).await {
            Ok(msg) => Ok(msg),
            Err(e) => {
                if e.is_body_error() && remaining > 0 {
                    let _ = reader.drain(remaining as usize).await;
                }
                Err(e)
            },
        }
    }

    async fn decode_body<R>(
        reader: &mut FrameReader<R>,
        remaining: &mut i32,
    ) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let n_bets = reader.read_i32(remaining).await?;
        let mut bets = Vec::with_capacity(n_bets.max(0) as usize);
        for _ in 0..n_bets {
            bets.push(Self::read_bet(reader, remaining).await?);
        }
        if *remaining != 0 {
            return Err(ProtocolError::LengthMismatch);
        }
        Ok(Self { amount: n_bets, bets })
    }

    async fn read_bet<R>(
        reader: &mut FrameReader<R>,
        remaining: &mut i32,
    ) -> Result<RawBet, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        let n_pairs = reader.read_i32(remaining).await?;
        if n_pairs != REQUIRED_KEYS.len() as i32 {
            return Err(ProtocolError::InvalidBody);
        }

        let mut fields: HashMap<String, String> =
            HashMap::with_capacity(REQUIRED_KEYS.len());
        for _ in 0..n_pairs {
            let key = reader.read_string(remaining).await?;
            let value = reader.read_string(remaining).await?;
            fields.insert(key, value);
        }

        // Duplicate or unknown keys leave a required one missing.
        let mut take = |k: &str| fields.remove(k).ok_or(ProtocolError::InvalidBody);
        Ok(RawBet {
            agency: take("AGENCIA")?,
            first_name: take("NOMBRE")?,
            last_name: take("APELLIDO")?,
            document: take("DOCUMENTO")?,
            birthdate: take("NACIMIENTO")?,
            number: take("NUMERO")?,
        })
    }
}
