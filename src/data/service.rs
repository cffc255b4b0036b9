//! Resource Service Adapters
//!
//! The four collection operations a Data Machine can request. Implementations
//! own transport and serialization; every error is normalized to a
//! [`Failure`] before it reaches the machine.

use async_trait::async_trait;

use super::query::FetchQuery;
use crate::failure::Failure;
use crate::resource::Resource;

/// Backend for one resource collection
#[async_trait]
pub trait ResourceService<R: Resource>: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    /// Fetch the collection, in server order
    async fn list(&self, query: &FetchQuery) -> Result<Vec<R>, Failure>;

    /// Create a record; returns the stored record with server-assigned fields
    async fn create(&self, draft: R::Draft) -> Result<R, Failure>;

    async fn update(&self, record: R) -> Result<R, Failure>;

    async fn delete(&self, id: &R::Id) -> Result<(), Failure>;
}
