//! Auth Machine events and effect descriptors

use super::session::{Credentials, SessionGrant};
use crate::failure::Failure;
use crate::machine::{EventTag, Ticket};
use crate::users::{NewUser, ProfilePatch, User};

/// Successful adapter outcome
#[derive(Debug, Clone, PartialEq)]
pub enum AuthReply {
    /// Login, signup, session check or refresh
    Session(SessionGrant),
    /// Profile update
    Profile(User),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// Restore an existing session (app start)
    CheckSession,
    Login(Credentials),
    Signup(NewUser),
    Update(ProfilePatch),
    /// Silent session renewal
    Refresh,
    Logout,
    Resolved { ticket: Ticket, reply: AuthReply },
    Rejected { ticket: Ticket, failure: Failure },
}

impl EventTag for AuthEvent {
    fn tag(&self) -> &'static str {
        match self {
            AuthEvent::CheckSession => "CHECK_SESSION",
            AuthEvent::Login(_) => "LOGIN",
            AuthEvent::Signup(_) => "SIGNUP",
            AuthEvent::Update(_) => "UPDATE",
            AuthEvent::Refresh => "REFRESH",
            AuthEvent::Logout => "LOGOUT",
            AuthEvent::Resolved { .. } => "RESOLVED",
            AuthEvent::Rejected { .. } => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthEffect {
    /// Also used for refresh
    CheckSession { ticket: Ticket },
    Login { ticket: Ticket, credentials: Credentials },
    Signup { ticket: Ticket, user: NewUser },
    UpdateProfile {
        ticket: Ticket,
        user_id: String,
        patch: ProfilePatch,
    },
    /// Tell the server; the outcome is not fed back
    EndSession,
}

impl AuthEffect {
    pub fn ticket(&self) -> Option<Ticket> {
        match self {
            AuthEffect::CheckSession { ticket }
            | AuthEffect::Login { ticket, .. }
            | AuthEffect::Signup { ticket, .. }
            | AuthEffect::UpdateProfile { ticket, .. } => Some(*ticket),
            AuthEffect::EndSession => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthEffect::CheckSession { .. } => "check_session",
            AuthEffect::Login { .. } => "login",
            AuthEffect::Signup { .. } => "signup",
            AuthEffect::UpdateProfile { .. } => "update_profile",
            AuthEffect::EndSession => "end_session",
        }
    }
}
