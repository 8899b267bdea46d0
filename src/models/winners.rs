// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::{BufMut, Bytes, BytesMut};

use crate::{codec::send::Encode, models::opcode::Opcode};

/// WINNERS frame: the winning documents for one agency, in the order the
/// store loaded them. An agency without winners gets an empty list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Winners {
    pub documents: Vec<String>,
}

impl Encode for Winners {
    fn encode(&self) -> Bytes {
        // The frame length is computed from the same byte lengths the body
        // writer emits, so the frame is self-consistent by construction.
        let body_len: i32 = 4 + self
            .documents
            .iter()
            .map(|d| 4 + d.len() as i32)
            .sum::<i32>();

        let mut buf = BytesMut::with_capacity(5 + body_len as usize);
        buf.put_u8(Opcode::Winners as u8);
        buf.put_i32_le(body_len);
        buf.put_i32_le(self.documents.len() as i32);
        for document in &self.documents {
            buf.put_i32_le(document.len() as i32);
            buf.put_slice(document.as_bytes());
        }
        buf.freeze()
    }
}
