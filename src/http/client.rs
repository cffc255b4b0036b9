//! Shared API client
//!
//! One reqwest client and cookie jar per process, so every adapter rides
//! on the same session cookie.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ApiConfig, ConfigError};
use crate::failure::Failure;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    jar: Arc<Jar>,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ConfigError> {
        // Url::join drops the last segment of a base without trailing slash
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| ConfigError::Invalid {
            field: "api.base_url",
            reason: e.to_string(),
        })?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ConfigError::Invalid {
                field: "api",
                reason: e.to_string(),
            })?;

        Ok(Self { http, jar, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Cookie header the API has set for this client, if any
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.base)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    pub fn url(&self, path: &str) -> Result<Url, Failure> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Failure::validation(format!("Invalid path {}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, Failure> {
        let request = self.http.get(self.url(path)?).query(query);
        let response = self.send("GET", path, request).await?;
        Ok(response.json().await?)
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Failure> {
        let request = self.http.post(self.url(path)?).json(body);
        let response = self.send("POST", path, request).await?;
        Ok(response.json().await?)
    }

    /// POST without a body, discarding the response body
    pub async fn post_empty(&self, path: &str) -> Result<(), Failure> {
        let request = self.http.post(self.url(path)?);
        self.send("POST", path, request).await?;
        Ok(())
    }

    /// PATCH; returns the raw body, which may be empty
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, Failure> {
        let request = self.http.patch(self.url(path)?).json(body);
        let response = self.send("PATCH", path, request).await?;
        Ok(response.text().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<(), Failure> {
        let request = self.http.delete(self.url(path)?);
        self.send("DELETE", path, request).await?;
        Ok(())
    }

    /// Send and turn any non-2xx response into a [`Failure`]
    async fn send(&self, method: &str, path: &str, request: RequestBuilder) -> Result<Response, Failure> {
        let response = request.send().await?;
        let status = response.status();
        debug!(method, path, status = status.as_u16(), "API response");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        Err(Failure::from_status(status.as_u16(), message))
    }
}

/// `message` or `error` field of a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            timeout_ms: 1000,
        }
    }

    #[test]
    fn test_url_joining() {
        let client = ApiClient::new(&config("http://localhost:3001")).unwrap();
        assert_eq!(
            client.url("/bankAccounts").unwrap().as_str(),
            "http://localhost:3001/bankAccounts"
        );

        let client = ApiClient::new(&config("http://localhost:3001/api")).unwrap();
        assert_eq!(
            client.url("bankAccounts/abc").unwrap().as_str(),
            "http://localhost:3001/api/bankAccounts/abc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiClient::new(&config("not a url")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "api.base_url", .. }));
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Username or password is invalid"}"#),
            Some("Username or password is invalid".to_string())
        );
        assert_eq!(error_message(r#"{"error":"Not Found"}"#), Some("Not Found".to_string()));
        assert_eq!(error_message(r#"{}"#), None);
        assert_eq!(error_message("Unauthorized"), None);
    }

    #[test]
    fn test_no_cookie_before_login() {
        let client = ApiClient::new(&config("http://localhost:3001")).unwrap();
        assert_eq!(client.session_cookie(), None);
    }
}
