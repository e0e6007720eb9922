mod probe;
mod slp;

pub use probe::{ProbeResult, ServiceProbe, SlpProbe};
pub use slp::SlpClient;
