//! Resource Binding
//!
//! A [`Resource`] is a record type that a [`DataMachine`](crate::data::DataMachine)
//! can manage: it names its id and draft types, its draft validation rules
//! and whether a record is soft-deleted.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::validation::ValidationError;

pub trait Resource:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;
    /// Record under construction, without server-assigned fields
    type Draft: Clone + fmt::Debug + PartialEq + Serialize + Send + Sync + 'static;

    /// Human label used in notices ("Bank Account")
    const LABEL: &'static str;

    fn id(&self) -> &Self::Id;

    /// Soft-delete flag
    fn is_deleted(&self) -> bool {
        false
    }

    /// Checked before a CREATE leaves the machine
    fn validate_draft(_draft: &Self::Draft) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Checked before an UPDATE leaves the machine
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

/// Presentation order: active records first, soft-deleted last.
///
/// Stable, so insertion order is kept within each group. The machine itself
/// never reorders `records`.
pub fn active_first<R: Resource>(records: &[R]) -> Vec<&R> {
    let mut ordered: Vec<&R> = records.iter().collect();
    ordered.sort_by_key(|r| r.is_deleted());
    ordered
}
