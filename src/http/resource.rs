//! Collection adapter over [`ApiClient`]

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpResource;
use super::client::ApiClient;
use crate::data::{FetchQuery, ResourceService};
use crate::failure::Failure;

#[derive(Debug, Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

pub struct HttpResourceService<R> {
    client: Arc<ApiClient>,
    path: String,
    _marker: PhantomData<fn() -> R>,
}

impl<R: HttpResource> HttpResourceService<R> {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self::with_path(client, R::PATH)
    }

    /// Same resource served under another collection path
    /// (e.g. `transactions/public`)
    pub fn with_path(client: Arc<ApiClient>, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn list_path(&self, query: &FetchQuery) -> &str {
        match R::SEARCH_PATH {
            Some(search) if query.get("q").is_some() && self.path == R::PATH => search,
            _ => &self.path,
        }
    }

    fn item_path(&self, id: &R::Id) -> String {
        format!("{}/{}", R::PATH, id)
    }

    /// Pull the record out of `{"<item_key>": {...}}`
    fn unwrap_item(mut body: serde_json::Value) -> Result<R, Failure> {
        let item = body
            .get_mut(R::ITEM_KEY)
            .map(serde_json::Value::take)
            .ok_or_else(|| Failure::server(format!("Response has no \"{}\" field", R::ITEM_KEY)))?;
        serde_json::from_value(item).map_err(|e| Failure::server(format!("Malformed {}: {}", R::ITEM_KEY, e)))
    }
}

#[async_trait]
impl<R: HttpResource> ResourceService<R> for HttpResourceService<R> {
    fn name(&self) -> &'static str {
        R::PATH
    }

    async fn list(&self, query: &FetchQuery) -> Result<Vec<R>, Failure> {
        let page: Results<R> = self.client.get(self.list_path(query), query.params()).await?;
        Ok(page.results)
    }

    async fn create(&self, draft: R::Draft) -> Result<R, Failure> {
        let body: serde_json::Value = self.client.post(R::PATH, &draft).await?;
        Self::unwrap_item(body)
    }

    /// The API answers PATCH with an empty body or the stored item
    async fn update(&self, record: R) -> Result<R, Failure> {
        let body = self.client.patch(&self.item_path(record.id()), &record).await?;
        if body.trim().is_empty() {
            return Ok(record);
        }
        let value: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| Failure::server(format!("Malformed response: {}", e)))?;
        match value.get(R::ITEM_KEY) {
            Some(_) => Self::unwrap_item(value),
            None => Ok(record),
        }
    }

    async fn delete(&self, id: &R::Id) -> Result<(), Failure> {
        self.client.delete(&self.item_path(id)).await
    }
}
