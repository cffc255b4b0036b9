//! Machine Interpreter
//!
//! Single-consumer event loop around a pure [`Machine`]. Events from every
//! [`MachineHandle`] and from completed effects share one queue, so a machine
//! handles exactly one event at a time, in submission order.

use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::MachineError;
use super::{EffectRunner, EventTag, Machine};
use crate::notice::NoticeSink;

/// Audit entry published for every processed event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord<S> {
    pub machine: &'static str,
    pub event: &'static str,
    pub from: S,
    pub to: S,
    pub via: Option<S>,
    pub handled: bool,
}

/// Owns a machine and drives its effects
pub struct Interpreter<M: Machine> {
    machine: M,
    runner: Arc<dyn EffectRunner<M>>,
    events: mpsc::Receiver<M::Event>,
    /// Effects feed their outcome back through this; weak so that dropping
    /// every handle stops the loop once in-flight effects have finished.
    feedback: mpsc::WeakSender<M::Event>,
    snapshots: watch::Sender<M::Snapshot>,
    transitions: broadcast::Sender<TransitionRecord<M::State>>,
    notices: Option<Arc<dyn NoticeSink>>,
}

impl<M: Machine> Interpreter<M> {
    /// Create an interpreter and the first handle to it
    pub fn new(machine: M, runner: Arc<dyn EffectRunner<M>>, buffer: usize) -> (Self, MachineHandle<M>) {
        let buffer = buffer.max(1);
        let (events_tx, events_rx) = mpsc::channel(buffer);
        let (snapshots_tx, snapshots_rx) = watch::channel(machine.snapshot());
        let (transitions_tx, _) = broadcast::channel(buffer.max(16));

        let handle = MachineHandle {
            name: machine.name(),
            events: events_tx.clone(),
            snapshots: snapshots_rx,
            transitions: transitions_tx.clone(),
        };

        let interpreter = Self {
            machine,
            runner,
            events: events_rx,
            feedback: events_tx.downgrade(),
            snapshots: snapshots_tx,
            transitions: transitions_tx,
            notices: None,
        };

        (interpreter, handle)
    }

    /// Deliver machine notices to `sink`
    pub fn with_notices(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.notices = Some(sink);
        self
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// Process one event to completion: transition, publish, start effect.
    pub fn dispatch(&mut self, event: M::Event) -> TransitionRecord<M::State> {
        let name = self.machine.name();
        let tag = event.tag();
        // Held before publishing: a subscriber woken by the new snapshot may
        // drop the last handle before the effect is started
        let feedback = self.feedback.upgrade();
        let transition = self.machine.send(event);

        if transition.is_ignored() {
            debug!(machine = name, event = tag, state = %transition.from, "Event ignored");
        } else {
            debug!(
                machine = name,
                event = tag,
                from = %transition.from,
                to = %transition.to,
                via = ?transition.via,
                "Transition"
            );
        }

        let record = TransitionRecord {
            machine: name,
            event: tag,
            from: transition.from,
            to: transition.to,
            via: transition.via,
            handled: transition.handled,
        };

        // No subscribers is fine
        let _ = self.transitions.send(record.clone());
        self.snapshots.send_replace(self.machine.snapshot());

        if let Some(notice) = self.machine.take_notice()
            && let Some(sink) = &self.notices
        {
            sink.notify(notice);
        }

        if let Some(effect) = transition.effect {
            self.spawn_effect(effect, feedback);
        }

        record
    }

    /// Run `effect` on its own task. Without a feedback sender the effect
    /// still runs, only its outcome is discarded.
    fn spawn_effect(&self, effect: M::Effect, feedback: Option<mpsc::Sender<M::Event>>) {
        let name = self.machine.name();
        let runner = Arc::clone(&self.runner);

        tokio::spawn(async move {
            debug!(machine = name, effect = ?effect, "Running effect");
            let Some(event) = runner.run(effect).await else {
                return;
            };
            match feedback {
                Some(tx) => {
                    if tx.send(event).await.is_err() {
                        debug!(machine = name, "Machine stopped before effect completed");
                    }
                }
                None => warn!(machine = name, event = event.tag(), "No handle left, effect outcome dropped"),
            }
        });
    }

    /// Run until every handle is dropped and no effect is in flight
    pub async fn run(mut self) -> M {
        debug!(machine = self.machine.name(), state = %self.machine.state(), "Machine started");

        while let Some(event) = self.events.recv().await {
            self.dispatch(event);
        }

        debug!(machine = self.machine.name(), state = %self.machine.state(), "Machine stopped");
        self.machine
    }

    pub fn spawn(self) -> JoinHandle<M> {
        tokio::spawn(self.run())
    }
}

/// Cloneable client side of an [`Interpreter`]
pub struct MachineHandle<M: Machine> {
    name: &'static str,
    events: mpsc::Sender<M::Event>,
    snapshots: watch::Receiver<M::Snapshot>,
    transitions: broadcast::Sender<TransitionRecord<M::State>>,
}

impl<M: Machine> Clone for MachineHandle<M> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            events: self.events.clone(),
            snapshots: self.snapshots.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

impl<M: Machine> MachineHandle<M> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Queue an event (waits for queue capacity)
    pub async fn send(&self, event: M::Event) -> Result<(), MachineError> {
        self.events
            .send(event)
            .await
            .map_err(|_| MachineError::Stopped(self.name))
    }

    /// Queue an event without waiting
    pub fn try_send(&self, event: M::Event) -> Result<(), MachineError> {
        match self.events.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => {
                warn!(machine = self.name, event = event.tag(), "Event queue full");
                Err(MachineError::QueueFull(self.name))
            }
            Err(TrySendError::Closed(_)) => Err(MachineError::Stopped(self.name)),
        }
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> M::Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every processed event
    pub fn subscribe(&self) -> watch::Receiver<M::Snapshot> {
        self.snapshots.clone()
    }

    /// Audit trail of transitions processed from now on
    pub fn transitions(&self) -> broadcast::Receiver<TransitionRecord<M::State>> {
        self.transitions.subscribe()
    }

    /// Wait until the current or a later snapshot satisfies `accept`
    pub async fn wait_for<F>(&self, accept: F) -> Result<M::Snapshot, MachineError>
    where
        F: FnMut(&M::Snapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(accept)
            .await
            .map_err(|_| MachineError::Stopped(self.name))?;
        Ok(snapshot.clone())
    }

    /// Send `event`, then wait for a snapshot published after it that
    /// satisfies `accept`
    pub async fn send_until<F>(&self, event: M::Event, mut accept: F) -> Result<M::Snapshot, MachineError>
    where
        F: FnMut(&M::Snapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let _ = rx.borrow_and_update();
        self.send(event).await?;

        loop {
            rx.changed()
                .await
                .map_err(|_| MachineError::Stopped(self.name))?;
            let snapshot = rx.borrow_and_update().clone();
            if accept(&snapshot) {
                return Ok(snapshot);
            }
        }
    }
}
