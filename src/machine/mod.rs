//! Generic Finite-State Machine Plumbing
//!
//! Machines in this crate are pure: [`Machine::send`] maps `(state, event)` to
//! a [`Transition`] carrying the next state and at most one effect descriptor.
//! Nothing inside a machine performs I/O.
//!
//! # Driver
//!
//! ```text
//!   dispatch(event) ─▶ Interpreter ─▶ Machine::send ─▶ Transition
//!                          ▲                               │ effect
//!                          │                               ▼
//!                          └──── Resolved/Rejected ◀── EffectRunner (spawned)
//! ```
//!
//! The [`Interpreter`] owns the machine, processes one event at a time in
//! submission order, publishes a snapshot after every event and runs effects
//! on spawned tasks whose outcome re-enters the queue as a later event.
//!
//! # Stale responses
//!
//! Every effect carries a [`Ticket`]. A machine only accepts a completion
//! whose ticket matches the one it is still waiting on, so a response that
//! arrives after the machine left the issuing state is dropped.

pub mod error;
pub mod interpreter;

pub use error::MachineError;
pub use interpreter::{Interpreter, MachineHandle, TransitionRecord};

use std::fmt;

use async_trait::async_trait;

use crate::notice::Notice;

/// Generation stamp of an issued effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Ticket(u64);

impl Ticket {
    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result of feeding one event into a machine
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S, F> {
    pub from: S,
    pub to: S,
    /// Transient state passed through on the way to `to`
    pub via: Option<S>,
    /// Side effect to perform on entering `to`
    pub effect: Option<F>,
    /// False when the current state has no transition for the event
    pub handled: bool,
}

impl<S: Copy + PartialEq, F> Transition<S, F> {
    /// Event not accepted in `state`
    pub fn ignored(state: S) -> Self {
        Self {
            from: state,
            to: state,
            via: None,
            effect: None,
            handled: false,
        }
    }

    pub fn to(from: S, to: S) -> Self {
        Self {
            from,
            to,
            via: None,
            effect: None,
            handled: true,
        }
    }

    pub fn with_effect(mut self, effect: F) -> Self {
        self.effect = Some(effect);
        self
    }

    pub fn through(mut self, via: S) -> Self {
        self.via = Some(via);
        self
    }

    #[inline]
    pub fn is_ignored(&self) -> bool {
        !self.handled
    }

    #[inline]
    pub fn changed(&self) -> bool {
        self.from != self.to || self.via.is_some()
    }
}

/// Stable name of an event for logs and the transition audit trail
pub trait EventTag {
    fn tag(&self) -> &'static str;
}

/// A pure, synchronously testable state machine
pub trait Machine: Send + 'static {
    type State: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static;
    type Event: EventTag + fmt::Debug + Send + 'static;
    type Effect: fmt::Debug + Send + 'static;
    type Snapshot: Clone + fmt::Debug + Send + Sync + 'static;

    /// Machine name for logs and notices
    fn name(&self) -> &'static str;

    fn state(&self) -> Self::State;

    /// Apply one event. Must not perform I/O.
    fn send(&mut self, event: Self::Event) -> Transition<Self::State, Self::Effect>;

    /// Current state tag and context, as handed to consumers
    fn snapshot(&self) -> Self::Snapshot;

    /// Notice produced by the last transition, if any
    fn take_notice(&mut self) -> Option<Notice> {
        None
    }
}

/// Executes effect descriptors outside the machine
#[async_trait]
pub trait EffectRunner<M: Machine>: Send + Sync + 'static {
    /// Perform `effect`; the returned event is fed back into the machine.
    /// `None` means fire-and-forget.
    async fn run(&self, effect: M::Effect) -> Option<M::Event>;
}
