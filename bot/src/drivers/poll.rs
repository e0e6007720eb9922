use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{Driver, Drivers};
use crate::app::AppState;
use crate::config::AppConfig;
use crate::minecraft::SlpProbe;
use crate::publish::{ChannelTopicSink, StatusPublisher};
use crate::reconcile::Reconciler;

/// Hosts the reconciler loop as a driver so it starts and stops with the
/// rest of the process.
pub struct PollDriver {
    app_state: AppState,
    reconciler: Mutex<Reconciler>,
}

impl PollDriver {
    pub fn new(app_state: AppState) -> Self {
        let cfg = AppConfig::get();
        let sink = ChannelTopicSink::new(
            cfg.display.api_base.clone(),
            cfg.display.channel_id,
            cfg.display.token.clone(),
        );
        let reconciler = Reconciler::new(
            app_state.manager.clone(),
            app_state.instance_api.clone(),
            Arc::new(SlpProbe),
            StatusPublisher::new(Arc::new(sink)),
            Duration::from_secs(cfg.poll.interval_secs),
            cfg.probe.port,
            Duration::from_secs(cfg.probe.timeout_secs),
        );
        Self {
            app_state,
            reconciler: Mutex::new(reconciler),
        }
    }
}

#[async_trait::async_trait]
impl Driver for PollDriver {
    async fn run(&self) -> () {
        let mut reconciler = self.reconciler.lock().await;
        reconciler.run(self.app_state.stop_notify.clone()).await;
    }

    fn get_driver_type(&self) -> Drivers {
        Drivers::Poll
    }
}
