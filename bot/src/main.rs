use crate::app::run_app;

mod app;
mod commands;
pub mod config;
mod drivers;
mod error;
mod instance;
mod minecraft;
mod publish;
mod reconcile;
mod storage;

fn init_logger() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();
    run_app().await
}
