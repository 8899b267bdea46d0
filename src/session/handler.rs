// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Per-connection session state machine.
//!
//! ```text
//! Reading ── NEW_BETS ──► persist + ack ──► Reading
//!    │
//!    ├─ FINISHED(agency) ──► AwaitRaffle ──► send WINNERS ──► close
//!    │
//!    └─ EOF / error / shutdown ──► close
//! ```
//!
//! This server runs in one-shot mode: FINISHED both signals completion and
//! awaits the WINNERS reply on the same connection. REQUEST_WINNERS frames
//! are decoded but rejected.

use std::{net::SocketAddr, pin::Pin, sync::Arc};

use anyhow::Result;
use tokio::net::{
    TcpStream,
    tcp::{OwnedReadHalf, OwnedWriteHalf},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    codec::{
        recv::{FrameReader, Inbound},
        send::{Outbound, send_msg},
    },
    models::{
        ack::{BetsRecvFail, BetsRecvSuccess},
        error::ProtocolError,
        new_bets::NewBets,
        winners::Winners,
    },
    raffle::coordinator::Coordinator,
    session::states::{State, Transition},
    storage::SharedStore,
};

/// Everything one client connection owns: the framed stream halves, the
/// shared collaborators and the shutdown token. The socket is released
/// exactly once, when the context drops at the end of [`SessionCtx::run`].
pub struct SessionCtx {
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
    store: SharedStore,
    coordinator: Arc<Coordinator>,
    cancel: CancellationToken,
}

impl SessionCtx {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        store: SharedStore,
        coordinator: Arc<Coordinator>,
        cancel: CancellationToken,
    ) -> Self {
        let (r, w) = stream.into_split();
        Self {
            reader: FrameReader::new(r),
            writer: w,
            peer,
            store,
            coordinator,
            cancel,
        }
    }

    /// Drives the state machine until a terminal transition.
    pub async fn run(mut self) -> Result<()> {
        let mut state = SessionStates::Reading(Reading);
        loop {
            let trans = match &state {
                SessionStates::Reading(s) => s.step(&mut self).await,
                SessionStates::AwaitRaffle(s) => s.step(&mut self).await,
            };
            match trans {
                Transition::Next(next, r) => {
                    r?;
                    state = next;
                },
                Transition::Stay(r) => r?,
                Transition::Done(r) => return r,
            }
        }
    }

    /// Stores a batch and acknowledges it. The success ack is only written
    /// after the store call returned, so an acknowledged batch is always
    /// visible to the raffle. A storage failure is a per-batch signal; the
    /// session keeps reading.
    async fn handle_new_bets(&mut self, batch: NewBets) -> Result<()> {
        let amount = batch.amount;
        // Keep (document, number) around for the per-bet logs; the bets
        // themselves move into the store.
        let receipt: Vec<(String, String)> = batch
            .bets
            .iter()
            .map(|b| (b.document.clone(), b.number.clone()))
            .collect();

        let stored = {
            let mut store = self.store.lock().await;
            store.store_bets(batch.bets)
        };

        match stored {
            Ok(_) => {
                for (document, number) in &receipt {
                    info!(
                        action = "apuesta_almacenada",
                        result = "success",
                        dni = %document,
                        numero = %number
                    );
                }
                info!(action = "apuesta_recibida", result = "success", cantidad = amount);
                self.send_reply(Outbound::from(BetsRecvSuccess)).await
            },
            Err(e) => {
                error!(
                    action = "apuesta_recibida",
                    result = "fail",
                    cantidad = amount,
                    error = %e
                );
                self.send_reply(Outbound::from(BetsRecvFail)).await
            },
        }
    }

    /// Logs a decode failure and terminates the session. Body and framing
    /// errors get a best-effort BETS_RECV_FAIL first; a dead transport gets
    /// nothing.
    async fn abort_on_protocol_error(&mut self, e: ProtocolError) -> Result<()> {
        error!(
            action = "receive_message",
            result = "fail",
            ip = %self.peer.ip(),
            error = %e
        );
        if !matches!(e, ProtocolError::PeerClosed | ProtocolError::Transport(_)) {
            let _ = send_msg(&mut self.writer, &Outbound::from(BetsRecvFail)).await;
        }
        Err(e.into())
    }

    async fn send_reply(&mut self, msg: Outbound) -> Result<()> {
        send_msg(&mut self.writer, &msg).await.map_err(|e| {
            error!(
                action = "send_message",
                result = "fail",
                ip = %self.peer.ip(),
                error = %e
            );
            anyhow::Error::from(e)
        })
    }
}

/// Waiting for the next frame from the agency.
#[derive(Debug)]
pub struct Reading;

/// FINISHED received: blocked on the raffle rendezvous, then deliver the
/// winner list and close.
#[derive(Debug)]
pub struct AwaitRaffle {
    pub agency_id: i32,
}

/// States of one client session.
#[derive(Debug)]
pub enum SessionStates {
    Reading(Reading),
    AwaitRaffle(AwaitRaffle),
}

type SessionStepOut = Transition<SessionStates, Result<()>>;

impl State<SessionCtx, SessionStepOut> for Reading {
    type StepResult<'a>
        = Pin<Box<dyn Future<Output = SessionStepOut> + Send + 'a>>
    where
        Self: 'a,
        SessionCtx: 'a;

    fn step<'a>(&'a self, ctx: &'a mut SessionCtx) -> Self::StepResult<'a> {
        Box::pin(async move {
            let msg = tokio::select! {
                _ = ctx.cancel.cancelled() => return Transition::Done(Ok(())),
                msg = ctx.reader.recv_msg() => msg,
            };

            let inbound = match msg {
                // Clean EOF at a frame boundary: the agency is done with us.
                Ok(None) => return Transition::Done(Ok(())),
                Ok(Some(inbound)) => inbound,
                Err(e) => {
                    return Transition::Done(ctx.abort_on_protocol_error(e).await);
                },
            };

            info!(
                action = "receive_message",
                result = "success",
                ip = %ctx.peer.ip(),
                opcode = inbound.opcode() as u8
            );

            match inbound {
                Inbound::NewBets(batch) => match ctx.handle_new_bets(batch).await {
                    Ok(()) => Transition::Stay(Ok(())),
                    Err(e) => Transition::Done(Err(e)),
                },
                Inbound::Finished(msg) => Transition::Next(
                    SessionStates::AwaitRaffle(AwaitRaffle { agency_id: msg.agency_id }),
                    Ok(()),
                ),
                Inbound::RequestWinners(msg) => {
                    error!(
                        action = "receive_message",
                        result = "fail",
                        ip = %ctx.peer.ip(),
                        error = "REQUEST_WINNERS not accepted; FINISHED already carries the winners reply"
                    );
                    Transition::Done(Err(anyhow::anyhow!(
                        "REQUEST_WINNERS from agency {} rejected",
                        msg.agency_id
                    )))
                },
            }
        })
    }
}

impl State<SessionCtx, SessionStepOut> for AwaitRaffle {
    type StepResult<'a>
        = Pin<Box<dyn Future<Output = SessionStepOut> + Send + 'a>>
    where
        Self: 'a,
        SessionCtx: 'a;

    fn step<'a>(&'a self, ctx: &'a mut SessionCtx) -> Self::StepResult<'a> {
        Box::pin(async move {
            let agency = self.agency_id;

            tokio::select! {
                // Server shutdown while blocked on the rendezvous: the
                // agency observes the connection closing instead of WINNERS.
                _ = ctx.cancel.cancelled() => return Transition::Done(Ok(())),
                _ = ctx.coordinator.signal_finished(agency) => {},
            }

            let documents = ctx.coordinator.winners_for(agency);
            let reply = Outbound::from(Winners { documents });
            match send_msg(&mut ctx.writer, &reply).await {
                Ok(()) => {
                    info!(action = "enviar_ganadores", result = "success", agencia = agency);
                    Transition::Done(Ok(()))
                },
                Err(e) => {
                    error!(
                        action = "enviar_ganadores",
                        result = "fail",
                        agencia = agency,
                        error = %e
                    );
                    Transition::Done(Err(e.into()))
                },
            }
        })
    }
}
