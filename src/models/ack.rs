// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::{BufMut, Bytes, BytesMut};

use crate::{codec::send::Encode, models::opcode::Opcode};

/// Positive acknowledgement for a NEW_BETS batch. Empty body.
#[derive(Debug, Default, Clone, Copy)]
pub struct BetsRecvSuccess;

/// Negative acknowledgement: the batch was malformed or failed to persist.
/// Empty body.
#[derive(Debug, Default, Clone, Copy)]
pub struct BetsRecvFail;

impl Encode for BetsRecvSuccess {
    fn encode(&self) -> Bytes {
        encode_empty(Opcode::BetsRecvSuccess)
    }
}

impl Encode for BetsRecvFail {
    fn encode(&self) -> Bytes {
        encode_empty(Opcode::BetsRecvFail)
    }
}

fn encode_empty(opcode: Opcode) -> Bytes {
    let mut buf = BytesMut::with_capacity(5);
    buf.put_u8(opcode as u8);
    buf.put_i32_le(0);
    buf.freeze()
}
