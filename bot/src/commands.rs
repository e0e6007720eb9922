use log::error;
use warden_protocol::v1::Command;

use crate::instance::{InstanceApi, InstanceState};

pub const REPLY_WENT_WRONG: &str = "Something went wrong with the command.";

/// Runs one user intent against the instance api and always produces a
/// reply. Handler errors become the generic failure line instead of
/// propagating into the front-end task.
pub async fn dispatch(command: Command, api: &dyn InstanceApi) -> String {
    let outcome = match command {
        Command::Ip => ip(api).await,
        Command::Status => status(api).await,
        Command::Spinup => spinup(api).await,
        Command::Spindown => spindown(api).await,
    };
    outcome.unwrap_or_else(|err| {
        error!("command {} failed: {:#}", command, err);
        REPLY_WENT_WRONG.to_string()
    })
}

async fn ip(api: &dyn InstanceApi) -> anyhow::Result<String> {
    Ok(match api.describe_state().await? {
        InstanceState::Pending => {
            "Please wait, the server is currently starting up.".to_string()
        }
        InstanceState::Running => match api.describe_address().await? {
            Some(addr) => format!("The current server IP is {}", addr),
            // Running but the address is not allocated yet.
            None => "The server is not currently running.".to_string(),
        },
        _ => "The server is not currently running.".to_string(),
    })
}

async fn status(api: &dyn InstanceApi) -> anyhow::Result<String> {
    Ok(format!(
        "The server is currently {}.",
        api.describe_state().await?
    ))
}

/// Start the instance, unless the requested transition is already underway
/// or already satisfied; those cases answer without touching the provider.
async fn spinup(api: &dyn InstanceApi) -> anyhow::Result<String> {
    Ok(match api.describe_state().await? {
        InstanceState::Pending => "The server is already starting up.".to_string(),
        InstanceState::Running => "The server is already running.".to_string(),
        InstanceState::ShuttingDown | InstanceState::Stopping => {
            "Please wait, the server is currently shutting down.".to_string()
        }
        InstanceState::Stopped | InstanceState::Terminated => {
            api.set_power(true).await?;
            "The server has been started.".to_string()
        }
    })
}

async fn spindown(api: &dyn InstanceApi) -> anyhow::Result<String> {
    Ok(match api.describe_state().await? {
        InstanceState::Pending => {
            "Please wait, the server is currently starting up.".to_string()
        }
        InstanceState::ShuttingDown | InstanceState::Stopping => {
            "The server is already shutting down.".to_string()
        }
        InstanceState::Stopped | InstanceState::Terminated => {
            "The server was already stopped.".to_string()
        }
        InstanceState::Running => {
            api.set_power(false).await?;
            "The server has been stopped.".to_string()
        }
    })
}
