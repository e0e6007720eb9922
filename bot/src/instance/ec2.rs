use async_trait::async_trait;
use aws_sdk_ec2::error::ProvideErrorMetadata;
use log::{debug, info};

use super::state::InstanceState;
use crate::error::{PowerError, ProviderError};

/// Error code EC2 uses to say a dry run would have succeeded. The dry-run
/// response is always an "error"; this code is the only acceptable one.
const DRY_RUN_OK: &str = "DryRunOperation";

/// Seam between the reconciler/command handlers and the real instance api.
/// All calls are bound to the one instance resolved at startup.
#[async_trait]
pub trait InstanceApi: Send + Sync {
    /// Current lifecycle state. Failure means "unknown this cycle", the
    /// caller decides whether that is fatal.
    async fn describe_state(&self) -> Result<InstanceState, ProviderError>;

    /// Public address, present only while one is allocated. Absence is a
    /// normal value, not an error.
    async fn describe_address(&self) -> Result<Option<String>, ProviderError>;

    /// Validate-then-commit power change. Mutates real infrastructure; must
    /// only run on explicit user intent, never from the polling loop.
    async fn set_power(&self, on: bool) -> Result<(), PowerError>;
}

pub struct Ec2Client {
    client: aws_sdk_ec2::Client,
    instance_id: String,
}

impl Ec2Client {
    pub fn new(client: aws_sdk_ec2::Client, instance_id: String) -> Self {
        Self {
            client,
            instance_id,
        }
    }

    /// One-time startup call: no configured id means "the first instance
    /// this account can list". Not part of the polling loop.
    pub async fn resolve_instance_id(
        client: &aws_sdk_ec2::Client,
    ) -> Result<String, ProviderError> {
        let resp = client
            .describe_instances()
            .send()
            .await
            .map_err(|err| ProviderError::Api(err.to_string()))?;
        resp.reservations()
            .first()
            .and_then(|r| r.instances().first())
            .and_then(|i| i.instance_id())
            .map(str::to_owned)
            .ok_or(ProviderError::NoInstances)
    }

    async fn describe_self(&self) -> Result<aws_sdk_ec2::types::Instance, ProviderError> {
        let resp = self
            .client
            .describe_instances()
            .instance_ids(&self.instance_id)
            .send()
            .await
            .map_err(|err| ProviderError::Api(err.to_string()))?;
        resp.reservations()
            .first()
            .and_then(|r| r.instances().first())
            .cloned()
            .ok_or(ProviderError::Malformed("reservations[0].instances[0]"))
    }
}

/// Phase one of a power change. EC2 reports a dry run that would succeed as
/// an error carrying the [`DRY_RUN_OK`] code; anything else means the real
/// call must not be attempted.
fn verify_dry_run(code: Option<&str>, detail: &str) -> Result<(), PowerError> {
    match code {
        Some(DRY_RUN_OK) => Ok(()),
        _ => Err(PowerError::ValidationFailed(detail.to_string())),
    }
}

#[async_trait]
impl InstanceApi for Ec2Client {
    async fn describe_state(&self) -> Result<InstanceState, ProviderError> {
        let instance = self.describe_self().await?;
        let code = instance
            .state()
            .and_then(|s| s.code())
            .ok_or(ProviderError::Malformed("state.code"))?;
        let state = InstanceState::from_code(code)?;
        debug!("instance {} is {:?}", self.instance_id, state);
        Ok(state)
    }

    async fn describe_address(&self) -> Result<Option<String>, ProviderError> {
        let instance = self.describe_self().await?;
        Ok(instance.public_ip_address().map(str::to_owned))
    }

    async fn set_power(&self, on: bool) -> Result<(), PowerError> {
        if on {
            let dry = self
                .client
                .start_instances()
                .instance_ids(&self.instance_id)
                .dry_run(true)
                .send()
                .await;
            if let Err(err) = dry {
                let err = err.into_service_error();
                verify_dry_run(err.code(), &err.to_string())?;
            }
            self.client
                .start_instances()
                .instance_ids(&self.instance_id)
                .send()
                .await
                .map_err(|err| {
                    PowerError::OperationFailed(err.into_service_error().to_string())
                })?;
        } else {
            let dry = self
                .client
                .stop_instances()
                .instance_ids(&self.instance_id)
                .dry_run(true)
                .send()
                .await;
            if let Err(err) = dry {
                let err = err.into_service_error();
                verify_dry_run(err.code(), &err.to_string())?;
            }
            self.client
                .stop_instances()
                .instance_ids(&self.instance_id)
                .send()
                .await
                .map_err(|err| {
                    PowerError::OperationFailed(err.into_service_error().to_string())
                })?;
        }
        info!(
            "instance {} asked to {}",
            self.instance_id,
            if on { "start" } else { "stop" }
        );
        Ok(())
    }
}
