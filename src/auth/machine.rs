//! Auth Machine
//!
//! Pure transition function for the session lifecycle. See the module docs
//! of [`crate::auth`] for the transition table.

use tracing::{debug, info, warn};

use super::context::{AuthSnapshot, SessionContext};
use super::event::{AuthEffect, AuthEvent, AuthReply};
use super::state::AuthState;
use crate::failure::Failure;
use crate::machine::{Machine, Ticket, Transition};
use crate::notice::Notice;
use crate::users::{NewUser, ProfilePatch};

type Step = Transition<AuthState, AuthEffect>;

/// Which call an in-flight state is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    SessionCheck,
    Login,
    Signup,
    Refresh,
    Update,
}

#[derive(Debug, Clone)]
pub struct AuthMachine {
    name: &'static str,
    state: AuthState,
    context: SessionContext,
    ticket: Ticket,
    outstanding: Option<(Ticket, Attempt)>,
    notice: Option<Notice>,
}

impl Default for AuthMachine {
    fn default() -> Self {
        Self::new("auth")
    }
}

impl AuthMachine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            state: AuthState::Unauthorized,
            context: SessionContext::default(),
            ticket: Ticket::default(),
            outstanding: None,
            notice: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn outstanding(&self) -> Option<Ticket> {
        self.outstanding.map(|(ticket, _)| ticket)
    }

    pub fn transition(&mut self, event: AuthEvent) -> Step {
        self.notice = None;
        let from = self.state;

        match (from, event) {
            (AuthState::Unauthorized, AuthEvent::CheckSession) => {
                let ticket = self.issue(Attempt::SessionCheck);
                self.enter(from, AuthState::Loading)
                    .with_effect(AuthEffect::CheckSession { ticket })
            }
            (AuthState::Unauthorized, AuthEvent::Login(credentials)) => {
                self.context.set_auth_error(None);
                debug!(machine = self.name, username = credentials.username(), "Login attempt");
                let ticket = self.issue(Attempt::Login);
                self.enter(from, AuthState::Loading)
                    .with_effect(AuthEffect::Login { ticket, credentials })
            }
            (AuthState::Unauthorized, AuthEvent::Signup(user)) => self.begin_signup(user),

            (AuthState::Authorized, AuthEvent::Refresh) => {
                let ticket = self.issue(Attempt::Refresh);
                self.enter(from, AuthState::Refreshing)
                    .with_effect(AuthEffect::CheckSession { ticket })
            }
            (AuthState::Authorized, AuthEvent::Update(patch)) => self.begin_update(patch),

            (AuthState::Authorized | AuthState::Refreshing | AuthState::Updating, AuthEvent::Logout) => {
                self.logout(from)
            }

            (state, AuthEvent::Resolved { ticket, reply }) => match self.attempt_for(ticket) {
                Some(attempt) => self.resolve(attempt, reply),
                None => self.stale(state, ticket),
            },
            (state, AuthEvent::Rejected { ticket, failure }) => match self.attempt_for(ticket) {
                Some(attempt) => self.reject(attempt, failure),
                None => self.stale(state, ticket),
            },

            (state, _) => Transition::ignored(state),
        }
    }

    /// Attempt waiting on `ticket`, if the machine is still waiting on it
    fn attempt_for(&self, ticket: Ticket) -> Option<Attempt> {
        match self.outstanding {
            Some((outstanding, attempt)) if self.state.is_in_flight() && outstanding == ticket => {
                Some(attempt)
            }
            _ => None,
        }
    }

    fn stale(&self, state: AuthState, ticket: Ticket) -> Step {
        debug!(machine = self.name, ticket = %ticket, state = %state, "Stale response ignored");
        Transition::ignored(state)
    }

    fn issue(&mut self, attempt: Attempt) -> Ticket {
        self.ticket = self.ticket.next();
        self.outstanding = Some((self.ticket, attempt));
        self.ticket
    }

    fn enter(&mut self, from: AuthState, to: AuthState) -> Step {
        self.state = to;
        Transition::to(from, to)
    }

    fn begin_signup(&mut self, user: NewUser) -> Step {
        let from = self.state;
        if let Err(e) = user.validate() {
            let failure = Failure::from(e);
            self.notice = Some(Notice::warning(self.name, failure.message.clone()));
            self.context.set_auth_error(Some(failure));
            return self.enter(from, from);
        }

        self.context.set_auth_error(None);
        let ticket = self.issue(Attempt::Signup);
        self.enter(from, AuthState::Signup)
            .with_effect(AuthEffect::Signup { ticket, user })
    }

    fn begin_update(&mut self, patch: ProfilePatch) -> Step {
        let from = self.state;
        if let Err(e) = patch.validate() {
            let failure = Failure::from(e);
            self.notice = Some(Notice::warning(self.name, failure.message.clone()));
            self.context.set_update_error(Some(failure));
            return self.enter(from, from);
        }
        let Some(user_id) = self.context.current_user().map(|u| u.id.clone()) else {
            return Transition::ignored(from);
        };

        self.context.set_update_error(None);
        let ticket = self.issue(Attempt::Update);
        self.enter(from, AuthState::Updating)
            .with_effect(AuthEffect::UpdateProfile {
                ticket,
                user_id,
                patch,
            })
    }

    /// Clear the session and land in `unauthorized` within one step
    fn logout(&mut self, from: AuthState) -> Step {
        if let Some((ticket, attempt)) = self.outstanding.take() {
            debug!(machine = self.name, ticket = %ticket, attempt = ?attempt, "Logout drops outstanding call");
        }
        if let Some(user) = self.context.current_user() {
            info!(machine = self.name, user_id = %user.id, "Signed out");
        }
        self.context.clear();
        self.context.set_update_error(None);
        self.notice = Some(Notice::info(self.name, "Signed out"));

        self.enter(from, AuthState::Unauthorized)
            .through(AuthState::Logout)
            .with_effect(AuthEffect::EndSession)
    }

    fn resolve(&mut self, attempt: Attempt, reply: AuthReply) -> Step {
        let from = self.state;
        self.outstanding = None;

        match (attempt, reply) {
            (
                Attempt::SessionCheck | Attempt::Login | Attempt::Signup | Attempt::Refresh,
                AuthReply::Session(grant),
            ) => {
                match attempt {
                    Attempt::Refresh => {
                        debug!(machine = self.name, user_id = %grant.user.id, "Session refreshed")
                    }
                    Attempt::Signup => {
                        info!(machine = self.name, user_id = %grant.user.id, "Signed up");
                        self.notice = Some(Notice::success(
                            self.name,
                            format!("Welcome, {}", grant.user.display_name()),
                        ));
                    }
                    _ => info!(machine = self.name, user_id = %grant.user.id, "Session established"),
                }
                self.context.establish(grant);
                self.enter(from, AuthState::Authorized)
            }
            (Attempt::Update, AuthReply::Profile(user)) => {
                debug!(machine = self.name, user_id = %user.id, "Profile updated");
                self.context.replace_user(user);
                self.context.set_update_error(None);
                self.notice = Some(Notice::success(self.name, "Profile updated"));
                self.enter(from, AuthState::Authorized)
            }
            (attempt, reply) => {
                warn!(
                    machine = self.name,
                    attempt = ?attempt,
                    reply = ?reply,
                    "Reply does not match the outstanding call"
                );
                self.reject(attempt, Failure::server("Unexpected reply"))
            }
        }
    }

    fn reject(&mut self, attempt: Attempt, failure: Failure) -> Step {
        let from = self.state;
        self.outstanding = None;

        match attempt {
            Attempt::SessionCheck => {
                info!(machine = self.name, error = %failure, "No active session");
                self.enter(from, AuthState::Unauthorized)
            }
            Attempt::Login | Attempt::Signup => {
                warn!(machine = self.name, attempt = ?attempt, error = %failure, "Authentication failed");
                let message = if attempt == Attempt::Login && failure.is_authorization() {
                    "Username or password is invalid".to_string()
                } else {
                    failure.message.clone()
                };
                self.notice = Some(Notice::error(self.name, message));
                self.context.set_auth_error(Some(failure));
                self.enter(from, AuthState::Unauthorized)
            }
            Attempt::Refresh => self.force_logout(from, failure),
            Attempt::Update if failure.is_authorization() => self.force_logout(from, failure),
            Attempt::Update => {
                warn!(machine = self.name, error = %failure, "Profile update failed");
                self.notice = Some(Notice::error(
                    self.name,
                    format!("Profile update failed: {}", failure.message),
                ));
                self.context.set_update_error(Some(failure));
                self.enter(from, AuthState::Authorized)
            }
        }
    }

    /// Session is no longer valid on the server
    fn force_logout(&mut self, from: AuthState, failure: Failure) -> Step {
        warn!(machine = self.name, state = %from, error = %failure, "Session lost, signing out");
        self.context.clear();
        self.context.set_update_error(None);
        self.notice = Some(Notice::warning(
            self.name,
            "Your session has expired, please sign in again",
        ));
        self.enter(from, AuthState::Unauthorized)
    }
}

impl Machine for AuthMachine {
    type State = AuthState;
    type Event = AuthEvent;
    type Effect = AuthEffect;
    type Snapshot = AuthSnapshot;

    fn name(&self) -> &'static str {
        self.name
    }

    fn state(&self) -> AuthState {
        self.state
    }

    fn send(&mut self, event: AuthEvent) -> Step {
        self.transition(event)
    }

    fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot {
            state: self.state,
            current_user: self.context.current_user().cloned(),
            last_auth_error: self.context.last_auth_error().cloned(),
            update_error: self.context.update_error().cloned(),
        }
    }

    fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }
}
