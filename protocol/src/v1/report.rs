use serde::{Deserialize, Serialize};

/// Coarse service status as exposed to front-ends. `Online` carries its
/// player list in [`StatusReport::players`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Unknown,
    Unreachable,
    Online,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    pub instance_id: String,
    pub instance_state: String,
    pub service: ServiceState,
    pub players: Vec<String>,
}
