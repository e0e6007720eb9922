use log::debug;
use tokio::task::JoinSet;

use super::driver::Driver;
use std::sync::Arc;
use tokio::sync::Notify;

pub struct GracefulShutdown {
    drivers: Vec<Arc<dyn Driver>>,
}

impl GracefulShutdown {
    pub fn new() -> Self {
        Self { drivers: vec![] }
    }

    pub fn add_driver(&mut self, driver: impl Driver + 'static) {
        self.drivers.push(Arc::new(driver));
    }

    /// Runs every driver to completion, tripping `stop_notify` on the first
    /// termination signal so drivers wind down instead of dying mid-write.
    pub async fn watch(mut self, stop_notify: Arc<Notify>) {
        let shutdown = async move {
            wait_for_signal().await;
            stop_notify.notify_waiters();
        };

        let mut join_set = JoinSet::new();
        for driver in self.drivers.drain(..) {
            join_set.spawn(async move {
                driver.run().await;
            });
        }

        join_set.spawn(shutdown);
        debug!("graceful shutdown start watching");
        join_set.join_all().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut term =
        signal(SignalKind::terminate()).expect("graceful shutdown can't install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("graceful shutdown can't install ctrl+c signal handler");
}
