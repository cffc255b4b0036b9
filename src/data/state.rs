//! Data Machine State Definitions

use std::fmt;

/// Substate of `success`, chosen by whether the last fetch returned records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuccessState {
    WithData,
    WithoutData,
}

impl SuccessState {
    /// The single branching rule between the two substates
    #[inline]
    pub fn for_len(len: usize) -> Self {
        if len > 0 {
            SuccessState::WithData
        } else {
            SuccessState::WithoutData
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuccessState::WithData => "withData",
            SuccessState::WithoutData => "withoutData",
        }
    }
}

/// Data Machine states
///
/// `Loading`, `Creating`, `Updating` and `Deleting` each have exactly one
/// adapter call outstanding and accept nothing but its completion (or RESET).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataState {
    /// Nothing fetched yet
    Idle,
    /// `list()` in flight
    Loading,
    /// Last fetch succeeded
    Success(SuccessState),
    /// `create()` in flight
    Creating,
    /// `update()` in flight
    Updating,
    /// `delete()` in flight
    Deleting,
    /// Fetch or delete failed; waits for an explicit FETCH
    Failure,
}

impl DataState {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, DataState::Success(_))
    }

    /// Check if an adapter call is outstanding
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            DataState::Loading | DataState::Creating | DataState::Updating | DataState::Deleting
        )
    }

    /// Top-level tag ("success" for both substates)
    pub fn parent(&self) -> &'static str {
        match self {
            DataState::Success(_) => "success",
            other => other.as_str(),
        }
    }

    /// Full state path
    pub fn as_str(&self) -> &'static str {
        match self {
            DataState::Idle => "idle",
            DataState::Loading => "loading",
            DataState::Success(SuccessState::WithData) => "success.withData",
            DataState::Success(SuccessState::WithoutData) => "success.withoutData",
            DataState::Creating => "creating",
            DataState::Updating => "updating",
            DataState::Deleting => "deleting",
            DataState::Failure => "failure",
        }
    }
}

impl fmt::Display for DataState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
