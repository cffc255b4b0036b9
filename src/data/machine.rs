//! Generic Data Machine
//!
//! Pure transition function for the fetch/create/update/delete lifecycle of
//! one collection resource. See the module docs of [`crate::data`] for the
//! transition table.

use tracing::{debug, warn};

use super::context::{DataContext, DataSnapshot, Pending};
use super::event::{DataEffect, DataEvent, DataReply};
use super::state::{DataState, SuccessState};
use crate::failure::Failure;
use crate::machine::{Machine, Ticket, Transition};
use crate::notice::Notice;
use crate::resource::Resource;

type Step<R> = Transition<DataState, DataEffect<R>>;

/// Lifecycle machine for a collection of `R`
#[derive(Debug, Clone)]
pub struct DataMachine<R: Resource> {
    name: &'static str,
    state: DataState,
    context: DataContext<R>,
    /// Last issued ticket
    ticket: Ticket,
    /// Ticket of the call the machine is waiting on
    outstanding: Option<Ticket>,
    notice: Option<Notice>,
}

impl<R: Resource> DataMachine<R> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: DataState::Idle,
            context: DataContext::default(),
            ticket: Ticket::default(),
            outstanding: None,
            notice: None,
        }
    }

    pub fn state(&self) -> DataState {
        self.state
    }

    pub fn context(&self) -> &DataContext<R> {
        &self.context
    }

    pub fn records(&self) -> &[R] {
        &self.context.records
    }

    pub fn last_error(&self) -> Option<&Failure> {
        self.context.last_error.as_ref()
    }

    /// Ticket of the adapter call currently awaited
    pub fn outstanding(&self) -> Option<Ticket> {
        self.outstanding
    }

    /// Apply one event
    pub fn transition(&mut self, event: DataEvent<R>) -> Step<R> {
        self.notice = None;
        let from = self.state;

        match (from, event) {
            (_, DataEvent::Reset) => self.reset(from),

            (DataState::Idle | DataState::Success(_) | DataState::Failure, DataEvent::Fetch(query)) => {
                if let Some(query) = query {
                    self.context.query = query;
                }
                self.begin_fetch(from)
            }

            (DataState::Success(substate), DataEvent::Create(draft)) => {
                self.begin_create(substate, draft)
            }
            (DataState::Success(substate), DataEvent::Update(record)) => {
                self.begin_update(substate, record)
            }
            (DataState::Success(substate), DataEvent::Delete(id)) => {
                self.begin_delete(substate, id)
            }

            (state, DataEvent::Resolved { ticket, reply }) if self.awaits(ticket) => {
                self.resolve(state, reply)
            }
            (state, DataEvent::Rejected { ticket, failure }) if self.awaits(ticket) => {
                self.reject(state, failure)
            }
            (
                state,
                DataEvent::Resolved { ticket, .. } | DataEvent::Rejected { ticket, .. },
            ) => {
                debug!(
                    machine = self.name,
                    ticket = %ticket,
                    state = %state,
                    "Stale response ignored"
                );
                Transition::ignored(state)
            }

            (state, _) => Transition::ignored(state),
        }
    }

    #[inline]
    fn awaits(&self, ticket: Ticket) -> bool {
        self.state.is_in_flight() && self.outstanding == Some(ticket)
    }

    fn issue(&mut self) -> Ticket {
        self.ticket = self.ticket.next();
        self.outstanding = Some(self.ticket);
        self.ticket
    }

    fn enter(&mut self, from: DataState, to: DataState) -> Step<R> {
        self.state = to;
        Transition::to(from, to)
    }

    fn reset(&mut self, from: DataState) -> Step<R> {
        if let Some(ticket) = self.outstanding.take() {
            debug!(machine = self.name, ticket = %ticket, "Reset drops outstanding call");
        }
        self.context = DataContext::default();
        self.enter(from, DataState::Idle)
    }

    fn begin_fetch(&mut self, from: DataState) -> Step<R> {
        self.context.last_error = None;
        self.context.pending = None;
        self.context.resume = None;

        let ticket = self.issue();
        let query = self.context.query.clone();
        self.enter(from, DataState::Loading)
            .with_effect(DataEffect::List { ticket, query })
    }

    /// Guard failure: stay put with a validation error, issue nothing
    fn refuse(&mut self, substate: SuccessState, failure: Failure) -> Step<R> {
        debug!(machine = self.name, error = %failure, "Request refused before dispatch");
        self.notice = Some(Notice::warning(self.name, failure.message.clone()));
        self.context.last_error = Some(failure);
        let here = DataState::Success(substate);
        self.enter(here, here)
    }

    fn begin_create(&mut self, substate: SuccessState, draft: R::Draft) -> Step<R> {
        if let Err(e) = R::validate_draft(&draft) {
            return self.refuse(substate, e.into());
        }

        self.context.last_error = None;
        self.context.resume = Some(substate);
        self.context.pending = Some(Pending::Draft(draft.clone()));

        let ticket = self.issue();
        self.enter(DataState::Success(substate), DataState::Creating)
            .with_effect(DataEffect::Create { ticket, draft })
    }

    fn begin_update(&mut self, substate: SuccessState, record: R) -> Step<R> {
        if let Err(e) = record.validate() {
            return self.refuse(substate, e.into());
        }
        if self.context.find(record.id()).is_none() {
            let failure = Failure::validation(format!("No {} with id {}", R::LABEL, record.id()));
            return self.refuse(substate, failure);
        }

        self.context.last_error = None;
        self.context.resume = Some(substate);
        self.context.pending = Some(Pending::Update(record.clone()));

        let ticket = self.issue();
        self.enter(DataState::Success(substate), DataState::Updating)
            .with_effect(DataEffect::Update { ticket, record })
    }

    fn begin_delete(&mut self, substate: SuccessState, id: R::Id) -> Step<R> {
        match self.context.find(&id).map(|r| r.is_deleted()) {
            None => {
                let failure = Failure::validation(format!("No {} with id {}", R::LABEL, id));
                return self.refuse(substate, failure);
            }
            Some(true) => {
                let failure = Failure::validation(format!("{} {} is already deleted", R::LABEL, id));
                return self.refuse(substate, failure);
            }
            Some(false) => {}
        }

        self.context.last_error = None;
        self.context.resume = Some(substate);
        self.context.pending = Some(Pending::Deletion(id.clone()));

        let ticket = self.issue();
        self.enter(DataState::Success(substate), DataState::Deleting)
            .with_effect(DataEffect::Delete { ticket, id })
    }

    fn resolve(&mut self, state: DataState, reply: DataReply<R>) -> Step<R> {
        self.outstanding = None;

        match (state, reply) {
            (DataState::Loading, DataReply::Listed(records)) => {
                let substate = SuccessState::for_len(records.len());
                debug!(machine = self.name, count = records.len(), "Fetched");
                self.context.records = records;
                self.context.last_error = None;
                self.enter(state, DataState::Success(substate))
            }
            (DataState::Creating, DataReply::Created(record)) => {
                debug!(machine = self.name, id = %record.id(), "Created, refetching");
                self.refetch_after(state, "created")
            }
            (DataState::Updating, DataReply::Updated(record)) => {
                debug!(machine = self.name, id = %record.id(), "Updated, refetching");
                self.refetch_after(state, "updated")
            }
            (DataState::Deleting, DataReply::Deleted) => {
                debug!(machine = self.name, "Deleted, refetching");
                self.refetch_after(state, "deleted")
            }
            (state, reply) => {
                warn!(
                    machine = self.name,
                    state = %state,
                    reply = reply.as_str(),
                    "Reply does not match the outstanding call"
                );
                let failure = Failure::server(format!("Unexpected {} reply", reply.as_str()));
                self.reject(state, failure)
            }
        }
    }

    /// A confirmed mutation always goes back through `loading`
    fn refetch_after(&mut self, from: DataState, done: &str) -> Step<R> {
        let step = self.begin_fetch(from);
        self.notice = Some(Notice::success(self.name, format!("{} {}", R::LABEL, done)));
        step
    }

    fn reject(&mut self, state: DataState, failure: Failure) -> Step<R> {
        self.outstanding = None;
        self.context.pending = None;

        let action = match state {
            DataState::Loading => "fetch",
            DataState::Creating => "create",
            DataState::Updating => "update",
            DataState::Deleting => "delete",
            other => return Transition::ignored(other),
        };
        warn!(machine = self.name, action, error = %failure, "Request failed");
        self.notice = Some(Notice::error(
            self.name,
            format!("{} {} failed: {}", R::LABEL, action, failure.message),
        ));
        self.context.last_error = Some(failure);

        match state {
            DataState::Creating | DataState::Updating => {
                let substate = self
                    .context
                    .resume
                    .take()
                    .unwrap_or_else(|| SuccessState::for_len(self.context.records.len()));
                self.enter(state, DataState::Success(substate))
            }
            _ => {
                self.context.resume = None;
                self.enter(state, DataState::Failure)
            }
        }
    }
}

impl<R: Resource> Machine for DataMachine<R> {
    type State = DataState;
    type Event = DataEvent<R>;
    type Effect = DataEffect<R>;
    type Snapshot = DataSnapshot<R>;

    fn name(&self) -> &'static str {
        self.name
    }

    fn state(&self) -> DataState {
        self.state
    }

    fn send(&mut self, event: DataEvent<R>) -> Step<R> {
        self.transition(event)
    }

    fn snapshot(&self) -> DataSnapshot<R> {
        DataSnapshot {
            state: self.state,
            records: self.context.records.clone(),
            last_error: self.context.last_error.clone(),
            pending_deletion_id: self.context.pending_deletion_id().cloned(),
        }
    }

    fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
