//! Server bootstrap and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use log::{error, info};
use wallet_link::{LinkTimeouts, WalletLinkClient};

use crate::config::ServerConfig;
use crate::middleware::{self, GatePolicy, RequestGate};
use crate::routes;
use crate::validator::{LinkSessionValidator, SessionValidator};

/// Build the backend validator from the `[backend]` section.
pub fn build_validator(config: &ServerConfig) -> anyhow::Result<Arc<dyn SessionValidator>> {
    let timeouts = LinkTimeouts::builder()
        .request_timeout(Duration::from_secs(config.backend.validation_timeout_secs))
        .build();

    let client = WalletLinkClient::builder()
        .base_url(config.backend.api_base_url.clone())
        .timeouts(timeouts)
        .build()?;

    Ok(Arc::new(LinkSessionValidator::new(client)))
}

/// Serve the gated routes until the server stops or Ctrl+C arrives.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let validator = build_validator(&config)?;
    let policy = Arc::new(GatePolicy::from_settings(&config.gate));
    let gate = RequestGate::new(policy.clone(), validator);

    let bind_addr = config.bind_addr();
    info!(
        "Starting wallet gate on {} (backend: {})",
        bind_addr, config.backend.api_base_url
    );

    let server = HttpServer::new(move || {
        App::new()
            .wrap(gate.clone())
            .wrap(middleware::request_logger())
            .app_data(web::Data::from(policy.clone()))
            .configure(routes::configure)
    })
    .bind(&bind_addr)?;

    let server = if config.server.workers > 0 {
        server.workers(config.server.workers)
    } else {
        server
    };

    let server = server.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Err(e)) => error!("Server stopped with error: {}", e),
                Err(e) => error!("Server task failed: {}", e),
                Ok(Ok(())) => {},
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
            server_handle.stop(true).await;
        },
    }

    info!("Wallet gate stopped");
    Ok(())
}
