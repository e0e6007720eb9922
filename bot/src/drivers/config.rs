use super::Drivers;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriversConfig {
    pub enabled: Cow<'static, [Drivers]>,

    pub http_driver_config: HttpDriverConfig,
}

impl Default for DriversConfig {
    fn default() -> Self {
        Self {
            enabled: Cow::Borrowed(&[Drivers::Poll, Drivers::Http]),

            http_driver_config: HttpDriverConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpDriverConfig {
    pub uni_config: UniDriverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniDriverConfig {
    pub port: u16,
    pub host: IpAddr,
}

impl Default for UniDriverConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 11452,
        }
    }
}
