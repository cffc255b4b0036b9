//! Silent Session Refresh
//!
//! Background task that sends REFRESH on a fixed interval while the Auth
//! Machine is `authorized`.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::event::AuthEvent;
use super::machine::AuthMachine;
use super::state::AuthState;
use crate::machine::MachineHandle;

pub struct RefreshScheduler {
    handle: MachineHandle<AuthMachine>,
    interval: Duration,
}

impl RefreshScheduler {
    pub fn new(handle: MachineHandle<AuthMachine>, interval: Duration) -> Self {
        Self { handle, interval }
    }

    /// Run until the machine stops.
    ///
    /// The scheduler holds a handle, so the machine only stops once this
    /// task is aborted.
    pub async fn run(self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting session refresh scheduler"
        );
        let mut snapshots = self.handle.subscribe();

        loop {
            if snapshots
                .wait_for(|s| s.state == AuthState::Authorized)
                .await
                .is_err()
            {
                break;
            }

            let timer = tokio::time::sleep(self.interval);
            tokio::pin!(timer);

            let due = loop {
                tokio::select! {
                    _ = &mut timer => break true,
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        if !snapshots.borrow_and_update().state.is_logged_in() {
                            break false;
                        }
                    }
                }
            };

            // Skip a tick that lands while a refresh or update is in flight
            if due && self.handle.snapshot().state == AuthState::Authorized {
                debug!("Requesting silent refresh");
                if self.handle.send(AuthEvent::Refresh).await.is_err() {
                    break;
                }
            }
        }

        debug!("Session refresh scheduler stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
