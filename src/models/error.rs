// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

/// Failure modes of the framed wire protocol.
///
/// After `InvalidBody` and `LengthMismatch` the codec has already consumed
/// the rest of the announced body, so the stream is positioned at the next
/// frame boundary (see [`crate::models::new_bets::NewBets::read_from`]).
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Negative frame length, or a fixed-size body with the wrong length.
    #[error("invalid length")]
    InvalidLength,

    /// Body parse left bytes unread or tried to read past the body.
    #[error("indicated length doesn't match body length")]
    LengthMismatch,

    /// Malformed substructure: wrong pair count, missing required key,
    /// non-positive string length or non-UTF-8 payload.
    #[error("invalid body")]
    InvalidBody,

    #[error("invalid opcode: {0}")]
    InvalidOpcode(u8),

    /// Stream ended mid-frame. A close at a frame boundary is plain EOF and
    /// is surfaced as `Ok(None)` by `FrameReader::recv_msg` instead.
    #[error("peer closed connection")]
    PeerClosed,

    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
}

impl ProtocolError {
    /// Errors after which the codec drains the rest of the announced body so
    /// the stream stays frame-aligned.
    pub(crate) fn is_body_error(&self) -> bool {
        matches!(self, Self::InvalidBody | Self::LengthMismatch)
    }
}
