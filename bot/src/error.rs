use std::time::Duration;
use thiserror::Error;

/// Instance api failures. The reconciler treats any of these as "state
/// unknown this cycle" and keeps the last derived status; command handlers
/// surface them as a generic failure reply.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("instance api call failed: {0}")]
    Api(String),

    #[error("malformed api response: missing {0}")]
    Malformed(&'static str),

    #[error("unknown instance state code: {0}")]
    UnknownStateCode(i32),

    #[error("no instances visible to this account")]
    NoInstances,
}

/// Rejection of a power change. Validation failures happen before anything
/// was committed to the provider; operation failures after.
#[derive(Debug, Error)]
pub enum PowerError {
    #[error("power change rejected during validation: {0}")]
    ValidationFailed(String),

    #[error("power change failed: {0}")]
    OperationFailed(String),
}

/// Why a probe came back empty. Collapsed to `ProbeResult::Unreachable`
/// before it leaves the probe; the distinction only feeds log lines.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("probe failed: {0}")]
    Io(anyhow::Error),
}
