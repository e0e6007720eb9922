use chrono::{DateTime, Utc};
use log::{debug, info};
use std::ops::Deref;
use std::sync::{Arc, LazyLock};
use tokio::sync::Notify;

use crate::config::AppConfig;
use crate::drivers::{Drivers, GracefulShutdown, HttpDriver, PollDriver};
use crate::instance::{Ec2Client, InstanceApi, InstanceManager};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
static START_TIME: LazyLock<DateTime<Utc>> = LazyLock::new(Utc::now);

pub struct ApplicationState {
    pub stop_notify: Arc<Notify>,
    pub manager: Arc<InstanceManager>,
    pub instance_api: Arc<dyn InstanceApi>,
}
pub type AppState = Arc<ApplicationState>;

pub fn get_start_time() -> &'static DateTime<Utc> {
    START_TIME.deref()
}

async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::get();
    debug!(
        "config loaded: {}",
        serde_json::to_string_pretty(&config).unwrap()
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &config.instance.region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;
    let ec2 = aws_sdk_ec2::Client::new(&sdk_config);

    // One-time resolution; the id never changes for the process lifetime.
    let instance_id = match &config.instance.id {
        Some(id) => id.clone(),
        None => Ec2Client::resolve_instance_id(&ec2).await?,
    };
    info!("managing instance {}", instance_id);

    let state = ApplicationState {
        stop_notify: Arc::new(Notify::new()),
        manager: Arc::new(InstanceManager::new(instance_id.clone())),
        instance_api: Arc::new(Ec2Client::new(ec2, instance_id)),
    };
    Ok(Arc::new(state))
}

pub async fn run_app() -> anyhow::Result<()> {
    let _ = get_start_time();

    let state = init_app_state().await?;
    let mut gs = GracefulShutdown::new();

    for driver_type in AppConfig::get().drivers.enabled.iter() {
        match driver_type {
            Drivers::Poll => gs.add_driver(PollDriver::new(state.clone())),
            Drivers::Http => gs.add_driver(HttpDriver::new(state.clone())),
        }
    }

    gs.watch(state.stop_notify.clone()).await;
    info!("Bye.");
    Ok(())
}
