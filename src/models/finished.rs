// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use tokio::io::AsyncRead;

use crate::{codec::recv::FrameReader, models::error::ProtocolError};

/// Fixed body size shared by FINISHED and REQUEST_WINNERS.
const BODY_LEN: i32 = 4;

/// FINISHED: the sending agency has submitted its whole workload and now
/// waits for the raffle outcome on this connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub agency_id: i32,
}

impl Finished {
    pub async fn read_from<R>(
        reader: &mut FrameReader<R>,
        length: i32,
    ) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        Ok(Self { agency_id: read_agency_id(reader, length).await? })
    }
}

/// REQUEST_WINNERS: identical body layout to FINISHED. Decoded for
/// completeness; the session handler only accepts it in two-phase mode,
/// which this server does not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWinners {
    pub agency_id: i32,
}

impl RequestWinners {
    pub async fn read_from<R>(
        reader: &mut FrameReader<R>,
        length: i32,
    ) -> Result<Self, ProtocolError>
    where
        R: AsyncRead + Unpin,
    {
        Ok(Self { agency_id: read_agency_id(reader, length).await? })
    }
}

async fn read_agency_id<R>(
    reader: &mut FrameReader<R>,
    length: i32,
) -> Result<i32, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    if length != BODY_LEN {
        return Err(ProtocolError::InvalidLength);
    }
    let mut remaining = length;
    reader.read_i32(&mut remaining).await
}
