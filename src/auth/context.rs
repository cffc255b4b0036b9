//! Session Context

use super::session::{SessionGrant, SessionToken};
use super::state::AuthState;
use crate::failure::Failure;
use crate::users::User;

/// Data owned by the Auth Machine.
///
/// `current_user` and `refresh_token` are set and cleared together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionContext {
    refresh_token: Option<SessionToken>,
    current_user: Option<User>,
    /// Last failed login or signup
    last_auth_error: Option<Failure>,
    /// Last failed or refused profile update
    update_error: Option<Failure>,
}

impl SessionContext {
    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref()
    }

    pub fn last_auth_error(&self) -> Option<&Failure> {
        self.last_auth_error.as_ref()
    }

    pub fn update_error(&self) -> Option<&Failure> {
        self.update_error.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.refresh_token.is_some()
    }

    pub(crate) fn establish(&mut self, grant: SessionGrant) {
        self.refresh_token = Some(grant.session);
        self.current_user = Some(grant.user);
        self.last_auth_error = None;
        self.update_error = None;
    }

    pub(crate) fn replace_user(&mut self, user: User) {
        self.current_user = Some(user);
    }

    /// Drop the session; errors are kept for display
    pub(crate) fn clear(&mut self) {
        self.refresh_token = None;
        self.current_user = None;
    }

    pub(crate) fn set_auth_error(&mut self, failure: Option<Failure>) {
        self.last_auth_error = failure;
    }

    pub(crate) fn set_update_error(&mut self, failure: Option<Failure>) {
        self.update_error = failure;
    }
}

/// What consumers see after every transition
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub state: AuthState,
    pub current_user: Option<User>,
    pub last_auth_error: Option<Failure>,
    pub update_error: Option<Failure>,
}

impl AuthSnapshot {
    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in()
    }
}
