// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::collections::{HashMap, HashSet};

use once_cell::sync::OnceCell;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::storage::SharedStore;

/// Process-wide raffle rendezvous.
///
/// Tracks which agencies have declared completion, releases every waiter
/// once the expected number of *distinct* agencies has signaled, and runs
/// the raffle exactly once. The `finished` set is monotonic: entries are
/// only ever added.
pub struct Coordinator {
    expected: usize,
    finished: Mutex<HashSet<i32>>,
    winners: OnceCell<HashMap<i32, Vec<String>>>,
    done: CancellationToken,
    store: SharedStore,
}

impl Coordinator {
    pub fn new(expected: usize, store: SharedStore) -> Self {
        Self {
            expected,
            finished: Mutex::new(HashSet::with_capacity(expected)),
            winners: OnceCell::new(),
            done: CancellationToken::new(),
            store,
        }
    }

    /// Records `agency_id` as finished and waits until the raffle has run.
    ///
    /// The signaler whose distinct arrival completes the expected set is the
    /// leader and runs the raffle; everyone else, including a duplicate
    /// signal from an agency already counted, just waits on the done latch.
    /// The leader check and the insertion happen under one lock, so exactly
    /// one caller ever sees the set reach `expected`.
    pub async fn signal_finished(&self, agency_id: i32) {
        let is_leader = {
            let mut finished = self.finished.lock().await;
            finished.insert(agency_id) && finished.len() == self.expected
        };
        if is_leader {
            self.run_raffle().await;
        }
        self.done.cancelled().await;
    }

    /// Winning documents for one agency, in store load order. Meaningful
    /// once `signal_finished` has returned; an agency without winners gets
    /// an empty list.
    pub fn winners_for(&self, agency_id: i32) -> Vec<String> {
        self.winners
            .get()
            .and_then(|w| w.get(&agency_id).cloned())
            .unwrap_or_default()
    }

    /// True once the raffle result has been published.
    pub fn raffle_done(&self) -> bool {
        self.done.is_cancelled()
    }

    /// Loads every persisted bet, keeps the winners and groups their
    /// documents by agency in load order. The winners map is published
    /// before the done latch fires, and the latch fires even when the
    /// store fails, so no waiter can deadlock.
    async fn run_raffle(&self) {
        let computed = {
            let store = self.store.lock().await;
            store.load_bets().map(|bets| {
                let mut winners: HashMap<i32, Vec<String>> = HashMap::new();
                for bet in bets {
                    if store.has_won(&bet) {
                        winners.entry(bet.agency).or_default().push(bet.document);
                    }
                }
                winners
            })
        };

        let winners = match computed {
            Ok(w) => {
                info!(action = "sorteo", result = "success");
                w
            },
            Err(e) => {
                error!(action = "sorteo", result = "fail", error = %e);
                HashMap::new()
            },
        };

        let _ = self.winners.set(winners);
        self.done.cancel();
    }
}
