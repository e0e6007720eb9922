use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::instance::{InstanceApi, InstanceManager, InstanceState, ServiceStatus};
use crate::minecraft::{ProbeResult, ServiceProbe};
use crate::publish::StatusPublisher;

/// Unified status as a pure function of what the cloud api and the probe
/// reported this tick. `probe` is `None` when no probe was attempted.
pub fn derive_status(state: InstanceState, probe: Option<ProbeResult>) -> ServiceStatus {
    if !state.may_serve() {
        return ServiceStatus::Unreachable;
    }
    match probe {
        Some(ProbeResult::Online(players)) => ServiceStatus::Online(players),
        // The instance is up but the service did not answer; it may still be
        // booting, which is not the same as unreachable.
        Some(ProbeResult::Unreachable) => ServiceStatus::Unknown,
        None => ServiceStatus::Unknown,
    }
}

/// Tick-driven loop that keeps the shared manager and the display surface
/// in line with what the cloud api and the probe report.
pub struct Reconciler {
    manager: Arc<InstanceManager>,
    api: Arc<dyn InstanceApi>,
    probe: Arc<dyn ServiceProbe>,
    publisher: StatusPublisher,
    interval: Duration,
    probe_port: u16,
    probe_timeout: Duration,
}

impl Reconciler {
    pub fn new(
        manager: Arc<InstanceManager>,
        api: Arc<dyn InstanceApi>,
        probe: Arc<dyn ServiceProbe>,
        publisher: StatusPublisher,
        interval: Duration,
        probe_port: u16,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            manager,
            api,
            probe,
            publisher,
            interval,
            probe_port,
            probe_timeout,
        }
    }

    /// One polling pass. A fetch failure keeps the previous status rather
    /// than overwriting it with a guess; the loop itself never gives up.
    pub async fn tick(&mut self) {
        let state = match self.api.describe_state().await {
            Ok(state) => state,
            Err(err) => {
                warn!("skipping tick, could not read instance state: {}", err);
                return;
            }
        };

        let probed = if state.may_serve() {
            match self.api.describe_address().await {
                Ok(Some(addr)) => Some(
                    self.probe
                        .probe(&addr, self.probe_port, self.probe_timeout)
                        .await,
                ),
                Ok(None) => None,
                Err(err) => {
                    warn!("skipping tick, could not read instance address: {}", err);
                    return;
                }
            }
        } else {
            // The lifecycle state already precludes the service; save the
            // round trip known to fail.
            None
        };

        let status = derive_status(state, probed);
        debug!("tick: instance {:?} -> {:?}", state, status);
        self.manager.set_status(status.clone()).await;
        self.publisher.publish(&status).await;
    }

    /// Polls until the stop token fires. The sleep is raced against the
    /// token so shutdown does not wait out a full interval. Ticks run on
    /// one task; an overrun tick delays the next, it never overlaps it.
    pub async fn run(&mut self, stop: Arc<Notify>) {
        loop {
            self.tick().await;
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = stop.notified() => break,
            }
        }
        debug!("reconciler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PowerError, ProviderError};
    use crate::publish::{TopicSink, TOPIC_NOT_RUNNING};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeApi {
        state: Option<InstanceState>,
        address: Option<String>,
    }

    #[async_trait]
    impl InstanceApi for FakeApi {
        async fn describe_state(&self) -> Result<InstanceState, ProviderError> {
            self.state.ok_or(ProviderError::Api("boom".to_string()))
        }

        async fn describe_address(&self) -> Result<Option<String>, ProviderError> {
            Ok(self.address.clone())
        }

        async fn set_power(&self, _on: bool) -> Result<(), PowerError> {
            panic!("the polling loop must never change instance power");
        }
    }

    struct FakeProbe {
        result: ProbeResult,
        calls: AtomicUsize,
    }

    impl FakeProbe {
        fn answering(result: ProbeResult) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ServiceProbe for FakeProbe {
        async fn probe(&self, _host: &str, _port: u16, _timeout: Duration) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.result.clone()
        }
    }

    struct RecordingSink {
        writes: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                writes: Mutex::new(Vec::new()),
            })
        }

        fn writes(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TopicSink for RecordingSink {
        async fn set_topic(&self, text: &str) -> anyhow::Result<()> {
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn reconciler(
        state: Option<InstanceState>,
        address: Option<&str>,
        probe: Arc<FakeProbe>,
        sink: Arc<RecordingSink>,
    ) -> (Reconciler, Arc<InstanceManager>) {
        let manager = Arc::new(InstanceManager::new("i-0abc".to_string()));
        let api = Arc::new(FakeApi {
            state,
            address: address.map(str::to_owned),
        });
        let r = Reconciler::new(
            Arc::clone(&manager),
            api,
            probe,
            StatusPublisher::new(sink),
            Duration::from_secs(5),
            25565,
            Duration::from_secs(3),
        );
        (r, manager)
    }

    #[test]
    fn derive_follows_the_status_table() {
        let online = ProbeResult::Online(vec!["alpha".to_string()]);
        assert_eq!(
            derive_status(InstanceState::Pending, None),
            ServiceStatus::Unknown
        );
        assert_eq!(
            derive_status(InstanceState::Running, Some(online)),
            ServiceStatus::Online(vec!["alpha".to_string()])
        );
        assert_eq!(
            derive_status(InstanceState::Running, Some(ProbeResult::Unreachable)),
            ServiceStatus::Unknown
        );
        assert_eq!(
            derive_status(InstanceState::Running, None),
            ServiceStatus::Unknown
        );
        for state in [
            InstanceState::ShuttingDown,
            InstanceState::Stopping,
            InstanceState::Terminated,
            InstanceState::Stopped,
        ] {
            assert_eq!(derive_status(state, None), ServiceStatus::Unreachable);
        }
    }

    #[tokio::test]
    async fn stopped_instance_is_never_probed() {
        let probe = FakeProbe::answering(ProbeResult::Unreachable);
        let sink = RecordingSink::new();
        let (mut r, manager) = reconciler(
            Some(InstanceState::Stopped),
            None,
            Arc::clone(&probe),
            Arc::clone(&sink),
        );

        r.tick().await;

        assert_eq!(probe.calls.load(Ordering::Relaxed), 0);
        assert_eq!(manager.status().await, ServiceStatus::Unreachable);
        assert_eq!(sink.writes(), vec![TOPIC_NOT_RUNNING.to_string()]);
    }

    #[tokio::test]
    async fn running_with_empty_player_set_goes_online() {
        let probe = FakeProbe::answering(ProbeResult::Online(vec![]));
        let sink = RecordingSink::new();
        let (mut r, manager) = reconciler(
            Some(InstanceState::Running),
            Some("203.0.113.7"),
            Arc::clone(&probe),
            Arc::clone(&sink),
        );

        r.tick().await;

        assert_eq!(probe.calls.load(Ordering::Relaxed), 1);
        assert_eq!(manager.status().await, ServiceStatus::Online(vec![]));
        assert_eq!(sink.writes(), vec!["No players currently online.".to_string()]);
    }

    #[tokio::test]
    async fn probe_timeout_while_running_means_unknown_not_unreachable() {
        let probe = FakeProbe::answering(ProbeResult::Unreachable);
        let sink = RecordingSink::new();
        let (mut r, manager) = reconciler(
            Some(InstanceState::Running),
            Some("203.0.113.7"),
            probe,
            Arc::clone(&sink),
        );

        r.tick().await;

        assert_eq!(manager.status().await, ServiceStatus::Unknown);
        assert_eq!(sink.writes(), vec![TOPIC_NOT_RUNNING.to_string()]);
    }

    #[tokio::test]
    async fn running_without_an_address_is_unknown_and_unprobed() {
        let probe = FakeProbe::answering(ProbeResult::Online(vec![]));
        let sink = RecordingSink::new();
        let (mut r, manager) = reconciler(
            Some(InstanceState::Running),
            None,
            Arc::clone(&probe),
            sink,
        );

        r.tick().await;

        assert_eq!(probe.calls.load(Ordering::Relaxed), 0);
        assert_eq!(manager.status().await, ServiceStatus::Unknown);
    }

    #[tokio::test]
    async fn api_failure_keeps_the_previous_status() {
        let probe = FakeProbe::answering(ProbeResult::Unreachable);
        let sink = RecordingSink::new();
        let (mut r, manager) = reconciler(None, None, probe, Arc::clone(&sink));

        let previous = ServiceStatus::Online(vec!["alpha".to_string()]);
        manager.set_status(previous.clone()).await;

        r.tick().await;

        assert_eq!(manager.status().await, previous);
        assert!(sink.writes().is_empty());
    }

    #[tokio::test]
    async fn repeated_identical_ticks_write_the_topic_once() {
        let probe = FakeProbe::answering(ProbeResult::Online(vec!["alpha".to_string()]));
        let sink = RecordingSink::new();
        let (mut r, _manager) = reconciler(
            Some(InstanceState::Running),
            Some("203.0.113.7"),
            probe,
            Arc::clone(&sink),
        );

        r.tick().await;
        r.tick().await;
        r.tick().await;

        assert_eq!(sink.writes(), vec!["Players online: alpha".to_string()]);
    }

    #[tokio::test]
    async fn run_exits_promptly_on_the_stop_token() {
        let probe = FakeProbe::answering(ProbeResult::Unreachable);
        let sink = RecordingSink::new();
        let (mut r, _manager) = reconciler(Some(InstanceState::Stopped), None, probe, sink);

        let stop = Arc::new(Notify::new());
        let stop_clone = Arc::clone(&stop);
        let handle = tokio::spawn(async move { r.run(stop_clone).await });

        // Give the loop a moment to enter its sleep, then stop it well
        // before the 5s interval would elapse.
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.notify_waiters();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("reconciler did not stop with the token")
            .unwrap();
    }
}
