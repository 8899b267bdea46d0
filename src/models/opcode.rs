// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The first byte of every frame is an op-code identifying the message that
//! follows. Op-codes 0, 3 and 4 travel agency → server; 1, 2 and 5 travel
//! server → agency.

/// All op-codes used on the wire.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    NewBets = 0,
    BetsRecvSuccess = 1,
    BetsRecvFail = 2,
    Finished = 3,
    RequestWinners = 4,
    Winners = 5,
}

impl Opcode {
    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::NewBets,
            1 => Self::BetsRecvSuccess,
            2 => Self::BetsRecvFail,
            3 => Self::Finished,
            4 => Self::RequestWinners,
            5 => Self::Winners,
            _ => return None,
        })
    }
}
