use axum::{
    extract::State,
    http::Method,
    routing::{get, post},
    Json, Router,
};
use log::info;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use warden_protocol::v1::{CommandReply, CommandRequest, ServiceState, StatusReport};

use super::{Driver, Drivers};
use crate::app::AppState;
use crate::commands;
use crate::config::AppConfig;
use crate::instance::ServiceStatus;

/// Plain request/response front door. Whatever chat front-end sits in
/// front of the bot talks to these three routes.
pub struct HttpDriver {
    app_state: AppState,
}

impl HttpDriver {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }
}

#[async_trait::async_trait]
impl Driver for HttpDriver {
    async fn run(&self) -> () {
        let uni_cfg = &AppConfig::get().drivers.http_driver_config.uni_config;
        let addr = SocketAddr::new(uni_cfg.host, uni_cfg.port);

        let app = Router::new()
            .route("/info", get(info_handler))
            .route("/api/v1/status", get(status_handler))
            .route("/api/v1/command", post(command_handler))
            .with_state(self.app_state.clone())
            .layer(
                CorsLayer::new()
                    .allow_origin(tower_http::cors::Any)
                    .allow_methods([Method::GET, Method::POST]),
            );

        let listener = TcpListener::bind(addr).await.expect("Failed to bind");
        info!("http driver listening on {}", addr);

        let stop_token = self.app_state.stop_notify.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                stop_token.notified().await;
                info!("Shutdown signal received, closing http driver...");
            })
            .await
            .unwrap();
    }

    fn get_driver_type(&self) -> Drivers {
        Drivers::Http
    }
}

async fn info_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "mc-warden",
        "version": crate::app::VERSION,
        "started_at": crate::app::get_start_time().to_rfc3339(),
    }))
}

/// Always answers, even when the instance api is down; the service side of
/// the report is the manager's last derived value.
async fn status_handler(State(state): State<AppState>) -> Json<StatusReport> {
    let instance_state = match state.instance_api.describe_state().await {
        Ok(s) => s.to_string(),
        Err(_) => "unknown".to_string(),
    };
    let (service, players) = match state.manager.status().await {
        ServiceStatus::Unknown => (ServiceState::Unknown, vec![]),
        ServiceStatus::Unreachable => (ServiceState::Unreachable, vec![]),
        ServiceStatus::Online(players) => (ServiceState::Online, players),
    };
    Json(StatusReport {
        instance_id: state.manager.instance_id().to_string(),
        instance_state,
        service,
        players,
    })
}

async fn command_handler(
    State(state): State<AppState>,
    Json(req): Json<CommandRequest>,
) -> Json<CommandReply> {
    let reply = commands::dispatch(req.command, state.instance_api.as_ref()).await;
    Json(CommandReply { reply })
}
