// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Inbound half of the frame codec.
//!
//! A frame is `[opcode:u8][body_length:i32 LE signed][body]`. Body decoders
//! run against a `remaining` counter initialized to `body_length`; every
//! primitive read subtracts exactly the bytes it consumed, and a decoder
//! that finishes with `remaining != 0` fails with `LengthMismatch`.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::models::{
    error::ProtocolError,
    finished::{Finished, RequestWinners},
    new_bets::NewBets,
    opcode::Opcode,
};

/// Messages a client may legally send.
#[derive(Debug)]
pub enum Inbound {
    NewBets(NewBets),
    Finished(Finished),
    RequestWinners(RequestWinners),
}

impl Inbound {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::NewBets(_) => Opcode::NewBets,
            Self::Finished(_) => Opcode::Finished,
            Self::RequestWinners(_) => Opcode::RequestWinners,
        }
    }
}

/// Reads length-prefixed frames off a byte stream. One per connection;
/// owns the read half of the socket.
#[derive(Debug)]
pub struct FrameReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Reads exactly `n` bytes, retrying transient interrupts. A peer close
    /// mid-read maps to `PeerClosed`; any other I/O failure to `Transport`.
    pub async fn recv_exactly(&mut self, n: usize) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::zeroed(n);
        let mut read = 0;
        while read < n {
            match self.inner.read(&mut buf[read..]).await {
                Ok(0) => return Err(ProtocolError::PeerClosed),
                Ok(nrecv) => read += nrecv,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ProtocolError::Transport(e)),
            }
        }
        Ok(buf.freeze())
    }

    pub async fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.recv_exactly(1).await?[0])
    }

    /// Reads a little-endian signed 32-bit integer, charging 4 bytes against
    /// `remaining`.
    pub async fn read_i32(
        &mut self,
        remaining: &mut i32,
    ) -> Result<i32, ProtocolError> {
        if *remaining < 4 {
            return Err(ProtocolError::LengthMismatch);
        }
        *remaining -= 4;
        let raw = self.recv_exactly(4).await?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(&raw);
        Ok(i32::from_le_bytes(arr))
    }

    /// Reads a protocol string: `[len:i32][len × UTF-8 bytes]` with
    /// `len > 0`, charged against `remaining`.
    pub async fn read_string(
        &mut self,
        remaining: &mut i32,
    ) -> Result<String, ProtocolError> {
        let len = self.read_i32(remaining).await?;
        if len <= 0 {
            return Err(ProtocolError::InvalidBody);
        }
        if *remaining < len {
            return Err(ProtocolError::LengthMismatch);
        }
        *remaining -= len;
        let raw = self.recv_exactly(len as usize).await?;
        String::from_utf8(raw.to_vec()).map_err(|_| ProtocolError::InvalidBody)
    }

    /// Consumes `n` leftover body bytes so the stream stays frame-aligned
    /// after a body decode error.
    pub async fn drain(&mut self, n: usize) -> Result<(), ProtocolError> {
        let _ = self.recv_exactly(n).await?;
        Ok(())
    }

    /// Reads one frame header and dispatches on the op-code.
    ///
    /// `Ok(None)` means the peer closed cleanly at a frame boundary; a close
    /// anywhere later in the frame is `PeerClosed`.
    pub async fn recv_msg(&mut self) -> Result<Option<Inbound>, ProtocolError> {
        let opcode = match self.read_u8().await {
            Ok(b) => b,
            Err(ProtocolError::PeerClosed) => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut header = 4i32;
        let length = self.read_i32(&mut header).await?;
        if length < 0 {
            return Err(ProtocolError::InvalidLength);
        }

        match Opcode::from_u8(opcode) {
            Some(Opcode::NewBets) => {
                Ok(Some(Inbound::NewBets(NewBets::read_from(self, length).await?)))
            },
            Some(Opcode::Finished) => {
                Ok(Some(Inbound::Finished(Finished::read_from(self, length).await?)))
            },
            Some(Opcode::RequestWinners) => Ok(Some(Inbound::RequestWinners(
                RequestWinners::read_from(self, length).await?,
            ))),
            // Server-to-client opcodes are never valid inbound.
            _ => Err(ProtocolError::InvalidOpcode(opcode)),
        }
    }
}
