//! Auth Service Adapter

use async_trait::async_trait;

use super::session::{Credentials, SessionGrant};
use crate::failure::Failure;
use crate::users::{NewUser, ProfilePatch, User};

/// Backend for session lifecycle calls
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Adapter name for logging
    fn name(&self) -> &'static str;

    async fn login(&self, credentials: &Credentials) -> Result<SessionGrant, Failure>;

    /// Resolve the session the client currently holds (app load and refresh)
    async fn check_session(&self) -> Result<SessionGrant, Failure>;

    /// Returns the user as stored after the patch
    async fn update_profile(&self, user_id: &str, patch: &ProfilePatch) -> Result<User, Failure>;

    /// Create the user and open a session for it
    async fn signup(&self, user: &NewUser) -> Result<SessionGrant, Failure>;

    async fn logout(&self) -> Result<(), Failure>;
}
