// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Outbound half of the frame codec.

use bytes::Bytes;
use enum_dispatch::enum_dispatch;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::models::{
    ack::{BetsRecvFail, BetsRecvSuccess},
    error::ProtocolError,
    winners::Winners,
};

/// Serialization of one complete outbound frame: opcode, body length, body.
#[enum_dispatch]
pub trait Encode {
    fn encode(&self) -> Bytes;
}

/// Frames the server sends back to an agency.
#[enum_dispatch(Encode)]
#[derive(Debug)]
pub enum Outbound {
    BetsRecvSuccess,
    BetsRecvFail,
    Winners,
}

/// Writes a whole frame with send-all semantics; `write_all` retries short
/// writes until the frame is on the wire or the transport fails.
pub async fn send_msg<W>(writer: &mut W, msg: &Outbound) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&msg.encode()).await?;
    Ok(())
}
