use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use super::slp::SlpClient;
use crate::error::ProbeError;

/// Outcome of one probe attempt. Connect failure, handshake garbage and
/// timeout all collapse to `Unreachable`; the reconciler already knows
/// whether the instance itself is powered, so it needs no finer grain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Online(Vec<String>),
    Unreachable,
}

#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Bounded-time handshake against the game server. Never blocks past
    /// `timeout` and never retries; retry cadence is the caller's interval.
    async fn probe(&self, host: &str, port: u16, timeout: Duration) -> ProbeResult;
}

/// Server-list-ping probe against the real game server.
pub struct SlpProbe;

impl SlpProbe {
    async fn query(host: &str, port: u16) -> anyhow::Result<Vec<String>> {
        let mut client = SlpClient::new().handshake(host, port).await?;
        let payload = client.status().await?;
        Ok(payload.player_names())
    }
}

#[async_trait]
impl ServiceProbe for SlpProbe {
    async fn probe(&self, host: &str, port: u16, timeout: Duration) -> ProbeResult {
        let err = match tokio::time::timeout(timeout, Self::query(host, port)).await {
            Ok(Ok(players)) => return ProbeResult::Online(players),
            Ok(Err(err)) => ProbeError::Io(err),
            Err(_) => ProbeError::Timeout(timeout),
        };
        debug!("probe of {}:{} failed: {}", host, port, err);
        ProbeResult::Unreachable
    }
}
