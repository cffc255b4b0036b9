//! Session handle and login input

use std::fmt;

use crate::users::User;

/// Opaque session handle (cookie value or refresh token).
///
/// Only the Auth Machine holds one; it is never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Successful login, signup or session check
#[derive(Debug, Clone, PartialEq)]
pub struct SessionGrant {
    pub session: SessionToken,
    pub user: User,
}

impl SessionGrant {
    pub fn new(session: SessionToken, user: User) -> Self {
        Self { session, user }
    }
}

/// Login input. Moved into the login effect and dropped once it resolves.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    remember: bool,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>, remember: bool) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            remember,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn remember(&self) -> bool {
        self.remember
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remember", &self.remember)
            .finish()
    }
}
