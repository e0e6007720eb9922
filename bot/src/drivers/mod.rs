mod config;
mod driver;
mod graceful_shutdown;
mod http;
mod poll;

pub use config::{DriversConfig, HttpDriverConfig, UniDriverConfig};
pub use driver::Driver;
pub use graceful_shutdown::GracefulShutdown;
pub use http::HttpDriver;
pub use poll::PollDriver;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Drivers {
    /// The reconciler's polling loop; the heart of the process.
    Poll,
    /// Request/response front door for chat front-ends.
    Http,
}
