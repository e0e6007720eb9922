use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::drivers::DriversConfig;
use crate::storage::file::{Config, FileIoWithBackup};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// immutable through full lifetime of app, unless restart app.
#[derive(Default)]
pub struct AppConfig {
    pub instance: InstanceConfig,
    pub poll: PollConfig,
    pub probe: ProbeConfig,
    pub display: DisplayConfig,
    pub drivers: DriversConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InstanceConfig {
    /// Resolved at startup from the first listed instance when absent.
    pub id: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between reconciler ticks. A policy knob, not a correctness
    /// one; keep it high enough not to rate-limit the cloud api.
    pub interval_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub port: u16,
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            port: 25565,
            timeout_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub api_base: String,
    pub channel_id: u64,
    pub token: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v10".to_string(),
            channel_id: 0,
            token: String::new(),
        }
    }
}

impl FileIoWithBackup for AppConfig {}

impl Config for AppConfig {
    type ConfigType = AppConfig;
}

impl AppConfig {
    fn load() -> AppConfig {
        Self::load_config_or_default("config.json", Self::default).unwrap()
    }
}

static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(AppConfig::load);

impl AppConfig {
    pub fn get() -> &'static AppConfig {
        &APP_CONFIG
    }
}
