use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The four user-facing intents a front-end can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Ip,
    Status,
    Spinup,
    Spindown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command: {0}")]
pub struct ParseCommandError(pub String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip" => Ok(Command::Ip),
            "status" => Ok(Command::Status),
            "spinup" => Ok(Command::Spinup),
            "spindown" => Ok(Command::Spindown),
            other => Err(ParseCommandError(other.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Command::Ip => "ip",
            Command::Status => "status",
            Command::Spinup => "spinup",
            Command::Spindown => "spindown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommandRequest {
    pub command: Command,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommandReply {
    pub reply: String,
}
