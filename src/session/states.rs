// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

/// Outcome of one state step: move to the next state, stay where we are, or
/// finish the session with a result.
pub enum Transition<S, R> {
    Next(S, R),
    Stay(R),
    Done(R),
}

/// One state of a per-connection state machine. `step` runs the state
/// against the session context and yields a [`Transition`].
pub trait State<Ctx, Out>: Sized {
    type StepResult<'a>: Future<Output = Out> + Send + 'a
    where
        Self: 'a,
        Out: 'a,
        Ctx: 'a;

    fn step<'a>(&'a self, ctx: &'a mut Ctx) -> Self::StepResult<'a>;
}
