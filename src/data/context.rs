//! Resource Collection Context

use super::query::FetchQuery;
use super::state::{DataState, SuccessState};
use crate::failure::Failure;
use crate::resource::Resource;

/// The one mutating request a machine may have in flight.
///
/// A single slot makes create, update and delete mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum Pending<R: Resource> {
    Draft(R::Draft),
    Update(R),
    Deletion(R::Id),
}

/// Data owned by one Data Machine instance
#[derive(Debug, Clone, PartialEq)]
pub struct DataContext<R: Resource> {
    /// Server order, as returned by the last successful fetch
    pub(crate) records: Vec<R>,
    pub(crate) last_error: Option<Failure>,
    pub(crate) pending: Option<Pending<R>>,
    /// Query of the last FETCH, reused by refetches
    pub(crate) query: FetchQuery,
    /// `success.*` substate to return to if a create/update is rejected
    pub(crate) resume: Option<SuccessState>,
}

impl<R: Resource> Default for DataContext<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            last_error: None,
            pending: None,
            query: FetchQuery::default(),
            resume: None,
        }
    }
}

impl<R: Resource> DataContext<R> {
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn last_error(&self) -> Option<&Failure> {
        self.last_error.as_ref()
    }

    pub fn query(&self) -> &FetchQuery {
        &self.query
    }

    pub fn pending_draft(&self) -> Option<&R::Draft> {
        match &self.pending {
            Some(Pending::Draft(draft)) => Some(draft),
            _ => None,
        }
    }

    pub fn pending_update(&self) -> Option<&R> {
        match &self.pending {
            Some(Pending::Update(record)) => Some(record),
            _ => None,
        }
    }

    pub fn pending_deletion_id(&self) -> Option<&R::Id> {
        match &self.pending {
            Some(Pending::Deletion(id)) => Some(id),
            _ => None,
        }
    }

    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.records.iter().find(|r| r.id() == id)
    }
}

/// What consumers see after every transition
#[derive(Debug, Clone, PartialEq)]
pub struct DataSnapshot<R: Resource> {
    pub state: DataState,
    pub records: Vec<R>,
    pub last_error: Option<Failure>,
    pub pending_deletion_id: Option<R::Id>,
}

impl<R: Resource> DataSnapshot<R> {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
