//! Cookie-session auth adapter

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ulid::Ulid;

use super::client::ApiClient;
use crate::auth::{AuthService, Credentials, SessionGrant, SessionToken};
use crate::failure::Failure;
use crate::users::{NewUser, ProfilePatch, User};

#[derive(Serialize)]
struct LoginBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    username: &'a str,
    password: &'a str,
    remember: bool,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

pub struct HttpAuthService {
    client: Arc<ApiClient>,
    /// `remember` flag for the login that follows a signup
    remember: bool,
}

impl HttpAuthService {
    pub fn new(client: Arc<ApiClient>, remember: bool) -> Self {
        Self { client, remember }
    }

    /// The session cookie, or a local handle when the API set none
    fn session_token(&self) -> SessionToken {
        match self.client.session_cookie() {
            Some(cookie) => SessionToken::new(cookie),
            None => {
                debug!("No session cookie set, using local handle");
                SessionToken::new(Ulid::new().to_string())
            }
        }
    }

    async fn current_user(&self) -> Result<User, Failure> {
        let envelope: UserEnvelope = self.client.get("checkAuth", &[]).await?;
        Ok(envelope.user)
    }
}

#[async_trait]
impl AuthService for HttpAuthService {
    fn name(&self) -> &'static str {
        "http_auth"
    }

    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, Failure> {
        let body = LoginBody {
            kind: "LOGIN",
            username: credentials.username(),
            password: credentials.password(),
            remember: credentials.remember(),
        };
        let envelope: UserEnvelope = self.client.post("login", &body).await?;
        Ok(SessionGrant::new(self.session_token(), envelope.user))
    }

    async fn check_session(&self) -> Result<SessionGrant, Failure> {
        let user = self.current_user().await?;
        Ok(SessionGrant::new(self.session_token(), user))
    }

    /// PATCH answers without the user, so re-read it
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<User, Failure> {
        self.client.patch(&format!("users/{}", user_id), patch).await?;
        self.current_user().await
    }

    async fn signup(&self, user: &NewUser) -> Result<SessionGrant, Failure> {
        let _: serde_json::Value = self.client.post("users", user).await?;
        debug!(username = %user.username, "Signed up, logging in");
        self.login(&user.credentials(self.remember)).await
    }

    async fn logout(&self) -> Result<(), Failure> {
        self.client.post_empty("logout").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_body() {
        let body = LoginBody {
            kind: "LOGIN",
            username: "Giovanna74",
            password: "s3cret",
            remember: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "type": "LOGIN",
                "username": "Giovanna74",
                "password": "s3cret",
                "remember": true
            })
        );
    }
}
