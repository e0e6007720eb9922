mod ec2;
mod manager;
mod state;

pub use ec2::{Ec2Client, InstanceApi};
pub use manager::{InstanceManager, ServiceStatus};
pub use state::InstanceState;
