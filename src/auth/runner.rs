//! Effect runner binding the Auth Machine to an [`AuthService`]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use tokio::task::JoinHandle;

use super::context::AuthSnapshot;
use super::event::{AuthEffect, AuthEvent, AuthReply};
use super::machine::AuthMachine;
use super::service::AuthService;
use crate::machine::{EffectRunner, Interpreter, MachineError, MachineHandle};
use crate::notice::NoticeSink;

pub struct AuthRunner {
    service: Arc<dyn AuthService>,
}

impl AuthRunner {
    pub fn new(service: Arc<dyn AuthService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EffectRunner<AuthMachine> for AuthRunner {
    async fn run(&self, effect: AuthEffect) -> Option<AuthEvent> {
        let op = effect.as_str();

        let (ticket, outcome) = match effect {
            AuthEffect::CheckSession { ticket } => (
                ticket,
                self.service.check_session().await.map(AuthReply::Session),
            ),
            AuthEffect::Login {
                ticket,
                credentials,
            } => (
                ticket,
                self.service.login(&credentials).await.map(AuthReply::Session),
            ),
            AuthEffect::Signup { ticket, user } => (
                ticket,
                self.service.signup(&user).await.map(AuthReply::Session),
            ),
            AuthEffect::UpdateProfile {
                ticket,
                user_id,
                patch,
            } => (
                ticket,
                self.service
                    .update_profile(&user_id, &patch)
                    .await
                    .map(AuthReply::Profile),
            ),
            AuthEffect::EndSession => {
                match self.service.logout().await {
                    Ok(()) => debug!(service = self.service.name(), "Server session ended"),
                    Err(e) => warn!(service = self.service.name(), error = %e, "Logout call failed"),
                }
                return None;
            }
        };

        Some(match outcome {
            Ok(reply) => AuthEvent::Resolved { ticket, reply },
            Err(failure) => {
                debug!(
                    service = self.service.name(),
                    op,
                    ticket = %ticket,
                    error = %failure,
                    "Auth call rejected"
                );
                AuthEvent::Rejected { ticket, failure }
            }
        })
    }
}

fn auth_interpreter(
    service: Arc<dyn AuthService>,
    buffer: usize,
    notices: Option<Arc<dyn NoticeSink>>,
) -> (Interpreter<AuthMachine>, MachineHandle<AuthMachine>) {
    let runner = Arc::new(AuthRunner::new(service));
    let (interpreter, handle) = Interpreter::new(AuthMachine::default(), runner, buffer);
    let interpreter = match notices {
        Some(sink) => interpreter.with_notices(sink),
        None => interpreter,
    };
    (interpreter, handle)
}

/// Start the Auth Machine on the current runtime
///
/// The initial session check is queued before the loop starts, so the
/// machine's first move is `unauthorized → loading`.
pub fn spawn_auth_machine(
    service: Arc<dyn AuthService>,
    buffer: usize,
    notices: Option<Arc<dyn NoticeSink>>,
) -> MachineHandle<AuthMachine> {
    let (interpreter, handle) = auth_interpreter(service, buffer, notices);
    if let Err(e) = handle.try_send(AuthEvent::CheckSession) {
        warn!(machine = handle.name(), error = %e, "Initial session check not queued");
    }
    interpreter.spawn();
    handle
}

/// Start the Auth Machine and wait for the initial session check to settle
///
/// Also returns the loop's task, which ends once every handle is dropped
/// and the last effect has finished.
pub async fn start_auth_machine(
    service: Arc<dyn AuthService>,
    buffer: usize,
    notices: Option<Arc<dyn NoticeSink>>,
) -> Result<(MachineHandle<AuthMachine>, JoinHandle<AuthMachine>, AuthSnapshot), MachineError> {
    let (interpreter, handle) = auth_interpreter(service, buffer, notices);
    let task = interpreter.spawn();
    let session = handle
        .send_until(AuthEvent::CheckSession, |s| !s.state.is_in_flight())
        .await?;
    Ok((handle, task, session))
}
