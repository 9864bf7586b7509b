// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Portico: a reactive API gateway bridging HTTP clients to microservices
//! behind a message broker.
//!
//! Every inbound HTTP request becomes one request envelope published with a
//! routing key derived from the path; the correlated reply envelope becomes
//! the HTTP response. Authentication, correlation, per-request deadlines and
//! backpressure are enforced in the gateway.

pub mod bridge;
pub mod config;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod routes;
pub mod state;
pub mod token;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::state::GatewayState;
use crate::transport::build_router;
use crate::transport::nats_pub::RequestPublisher;
use crate::transport::nats_sub::spawn_reply_listener;

/// Run the gateway until shutdown.
pub async fn run(config: GatewayConfig) -> anyhow::Result<()> {
    config.validate()?;

    let shutdown = CancellationToken::new();
    let (state, outbound_rx) = GatewayState::new(config.clone(), shutdown.clone())?;
    let state = Arc::new(state);

    if config.broker_enabled {
        let client = transport::nats_pub::connect(&config.broker_url).await?;
        spawn_reply_listener(Arc::clone(&state), client.clone());
        let publisher = RequestPublisher::new(
            client,
            config.services_exchange.clone(),
            state.reply_subject.clone(),
        );
        tokio::spawn(publisher.run(outbound_rx, shutdown.clone()));
    } else {
        // Closing the outbound buffer makes every bridge publish fail fast
        // with 503.
        drop(outbound_rx);
        tracing::warn!("broker disabled; bridged requests will be rejected");
    }

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        });
    }

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!(
        reply_subject = %state.reply_subject,
        "portico listening on {addr}"
    );
    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
