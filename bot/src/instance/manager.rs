use tokio::sync::RwLock;

/// What we last learned about the game server itself, as opposed to the
/// instance hosting it. Player order is whatever the probe returned;
/// rendering imposes its own order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ServiceStatus {
    /// Nothing conclusive this cycle: still booting, no address yet, or the
    /// probe did not get an answer from an otherwise healthy instance.
    #[default]
    Unknown,
    /// The instance state precludes the server from running.
    Unreachable,
    Online(Vec<String>),
}

/// Shared view of the one managed instance. Constructed once at startup and
/// passed by `Arc` to everything that needs it.
///
/// The reconciler is the sole writer of the status; command handlers and the
/// http driver only read, and may be up to one polling interval stale.
pub struct InstanceManager {
    instance_id: String,
    status: RwLock<ServiceStatus>,
}

impl InstanceManager {
    pub fn new(instance_id: String) -> Self {
        Self {
            instance_id,
            status: RwLock::new(ServiceStatus::Unknown),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub async fn status(&self) -> ServiceStatus {
        self.status.read().await.clone()
    }

    /// Single non-interruptible assignment under the write lock, so a
    /// concurrent reader sees either the old value or the new one.
    pub async fn set_status(&self, status: ServiceStatus) {
        *self.status.write().await = status;
    }
}
