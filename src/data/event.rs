//! Data Machine events and effect descriptors

use super::query::FetchQuery;
use crate::failure::Failure;
use crate::machine::{EventTag, Ticket};
use crate::resource::Resource;

/// Successful adapter outcome
#[derive(Debug, Clone, PartialEq)]
pub enum DataReply<R: Resource> {
    Listed(Vec<R>),
    Created(R),
    Updated(R),
    Deleted,
}

impl<R: Resource> DataReply<R> {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataReply::Listed(_) => "LISTED",
            DataReply::Created(_) => "CREATED",
            DataReply::Updated(_) => "UPDATED",
            DataReply::Deleted => "DELETED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent<R: Resource> {
    /// Fetch with a new query, or re-use the last one when `None`
    Fetch(Option<FetchQuery>),
    Create(R::Draft),
    Update(R),
    Delete(R::Id),
    /// Back to `idle`, dropping context and any outstanding call
    Reset,
    /// Completion of the effect issued under `ticket`
    Resolved { ticket: Ticket, reply: DataReply<R> },
    /// Failure of the effect issued under `ticket`
    Rejected { ticket: Ticket, failure: Failure },
}

impl<R: Resource> DataEvent<R> {
    /// FETCH re-using the last query
    pub fn fetch() -> Self {
        DataEvent::Fetch(None)
    }

    pub fn fetch_with(query: FetchQuery) -> Self {
        DataEvent::Fetch(Some(query))
    }
}

impl<R: Resource> EventTag for DataEvent<R> {
    fn tag(&self) -> &'static str {
        match self {
            DataEvent::Fetch(_) => "FETCH",
            DataEvent::Create(_) => "CREATE",
            DataEvent::Update(_) => "UPDATE",
            DataEvent::Delete(_) => "DELETE",
            DataEvent::Reset => "RESET",
            DataEvent::Resolved { .. } => "RESOLVED",
            DataEvent::Rejected { .. } => "REJECTED",
        }
    }
}

/// Adapter call to perform on entering an in-flight state
#[derive(Debug, Clone, PartialEq)]
pub enum DataEffect<R: Resource> {
    List { ticket: Ticket, query: FetchQuery },
    Create { ticket: Ticket, draft: R::Draft },
    Update { ticket: Ticket, record: R },
    Delete { ticket: Ticket, id: R::Id },
}

impl<R: Resource> DataEffect<R> {
    pub fn ticket(&self) -> Ticket {
        match self {
            DataEffect::List { ticket, .. }
            | DataEffect::Create { ticket, .. }
            | DataEffect::Update { ticket, .. }
            | DataEffect::Delete { ticket, .. } => *ticket,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataEffect::List { .. } => "list",
            DataEffect::Create { .. } => "create",
            DataEffect::Update { .. } => "update",
            DataEffect::Delete { .. } => "delete",
        }
    }
}
