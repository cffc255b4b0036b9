//! Driver Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    #[error("{0} machine is no longer running")]
    Stopped(&'static str),

    #[error("{0} machine event queue is full")]
    QueueFull(&'static str),
}

impl MachineError {
    pub fn code(&self) -> &'static str {
        match self {
            MachineError::Stopped(_) => "MACHINE_STOPPED",
            MachineError::QueueFull(_) => "QUEUE_FULL",
        }
    }
}
