use std::fmt;

use crate::error::ProviderError;

/// The six lifecycle states the cloud api can report for an instance.
/// Authoritative from the api only, never inferred locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl InstanceState {
    /// Maps an EC2 state code. The high byte is for the provider's internal
    /// use and must be masked off; only the low byte names the state.
    pub fn from_code(code: i32) -> Result<Self, ProviderError> {
        match code & 0xff {
            0 => Ok(InstanceState::Pending),
            16 => Ok(InstanceState::Running),
            32 => Ok(InstanceState::ShuttingDown),
            48 => Ok(InstanceState::Terminated),
            64 => Ok(InstanceState::Stopping),
            80 => Ok(InstanceState::Stopped),
            other => Err(ProviderError::UnknownStateCode(other)),
        }
    }

    /// Whether this state leaves room for the game server to be answering,
    /// or about to answer, on a public address. False means a probe is a
    /// network round trip already known to fail.
    pub fn may_serve(self) -> bool {
        matches!(self, InstanceState::Pending | InstanceState::Running)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Pairwise collapse for display: the shutting-down and stopped pairs
        // have no difference a user cares about.
        let s = match self {
            InstanceState::Pending => "starting up",
            InstanceState::Running => "running",
            InstanceState::ShuttingDown | InstanceState::Stopping => "shutting down",
            InstanceState::Terminated | InstanceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
