// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::models::bet::{Bet, RawBet};

pub mod csv;

/// The bet number the raffle pays out on.
pub const WINNING_NUMBER: i32 = 7574;

/// Persistence collaborator shared by every session and the raffle.
///
/// Implementations are not assumed thread-safe; callers serialize access
/// through [`SharedStore`].
pub trait BetStore {
    /// Parses and appends a batch in wire order. Returns the stored count.
    /// A batch is all-or-nothing: if any bet fails to parse, nothing is
    /// appended.
    fn store_bets(&mut self, bets: Vec<RawBet>) -> Result<usize>;

    /// All persisted bets, in the order they were stored.
    fn load_bets(&self) -> Result<Vec<Bet>>;

    /// Whether a bet is a raffle winner.
    fn has_won(&self, bet: &Bet) -> bool {
        bet.number == WINNING_NUMBER
    }
}

/// The single mutex every session handler and the raffle go through.
pub type SharedStore = Arc<Mutex<dyn BetStore + Send>>;

pub fn shared<S: BetStore + Send + 'static>(store: S) -> SharedStore {
    Arc::new(Mutex::new(store))
}
