//! Auth Machine State Definitions

use std::fmt;

/// Auth Machine States
///
/// `Loading`, `Signup`, `Refreshing` and `Updating` each wait on one adapter
/// call. `Logout` is transient: it is only ever reported as the `via` state
/// of a LOGOUT transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthState {
    /// No session
    #[default]
    Unauthorized,
    /// Session check or login in flight
    Loading,
    /// Session established, `currentUser` set
    Authorized,
    /// Silent session renewal in flight
    Refreshing,
    /// Profile update in flight
    Updating,
    /// Signup (and the login that follows it) in flight
    Signup,
    /// Session being torn down
    Logout,
}

impl AuthState {
    /// States in which `currentUser` is set
    #[inline]
    pub fn is_logged_in(&self) -> bool {
        matches!(
            self,
            AuthState::Authorized | AuthState::Refreshing | AuthState::Updating
        )
    }

    /// Check if an adapter call is outstanding
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            AuthState::Loading | AuthState::Refreshing | AuthState::Updating | AuthState::Signup
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthorized => "unauthorized",
            AuthState::Loading => "loading",
            AuthState::Authorized => "authorized",
            AuthState::Refreshing => "refreshing",
            AuthState::Updating => "updating",
            AuthState::Signup => "signup",
            AuthState::Logout => "logout",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
