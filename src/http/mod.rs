//! HTTP Adapters
//!
//! reqwest-backed implementations of [`ResourceService`](crate::data::ResourceService)
//! and [`AuthService`](crate::auth::AuthService).
//!
//! # Wire format
//!
//! - Collections: `GET /<path>` → `{"results": [...]}`
//! - Created items: `POST /<path>` → `{"<item_key>": {...}}`
//! - Session: cookie set by `POST /login`, checked with `GET /checkAuth`
//! - Errors: non-2xx status, optional `{"message": ...}` or `{"error": ...}` body

pub mod auth;
pub mod client;
pub mod resource;

pub use auth::HttpAuthService;
pub use client::ApiClient;
pub use resource::HttpResourceService;

use crate::resource::Resource;

/// Where a resource lives on the API
pub trait HttpResource: Resource {
    /// Collection path, relative to the base URL
    const PATH: &'static str;
    /// Key wrapping a single item in create responses
    const ITEM_KEY: &'static str;
    /// Used instead of `PATH` when the query carries a `q` parameter
    const SEARCH_PATH: Option<&'static str> = None;
}
