// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::AtomicU64;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::GatewayConfig;
use crate::registry::Registry;
use crate::routes::RouteTable;
use crate::token::TokenVerifier;

/// One request envelope queued for the broker publisher task.
#[derive(Debug)]
pub struct OutboundMessage {
    pub routing_key: String,
    pub correlation_id: String,
    pub trace_id: Option<String>,
    pub payload: Bytes,
}

/// Gateway-level counters (registry counters live on the registry itself).
#[derive(Default)]
pub struct GatewayMetrics {
    pub requests_total: AtomicU64,
    pub published_total: AtomicU64,
    pub broker_rejected_total: AtomicU64,
}

/// Shared gateway state.
pub struct GatewayState {
    pub config: GatewayConfig,
    pub registry: Registry,
    pub routes: RouteTable,
    pub verifier: TokenVerifier,
    /// Admission into the publisher task; `try_reserve` failure is the
    /// backpressure signal (503 before a slot is registered).
    pub outbound: mpsc::Sender<OutboundMessage>,
    /// Instance-unique reply subject published as `replyTo` on every message.
    pub reply_subject: String,
    pub instance_id: String,
    pub metrics: GatewayMetrics,
    pub shutdown: CancellationToken,
}

impl GatewayState {
    /// Build state plus the receiving end of the outbound publish buffer.
    ///
    /// The caller hands the receiver to the broker publisher task, or drops
    /// it when the broker is disabled (publishes then fail fast with 503).
    pub fn new(
        config: GatewayConfig,
        shutdown: CancellationToken,
    ) -> anyhow::Result<(Self, mpsc::Receiver<OutboundMessage>)> {
        let routes = config.route_table()?;
        let verifier = TokenVerifier::new(&config.jwt_secret, config.jwt_expiration())?;
        let registry = Registry::new(config.max_in_flight);
        let (outbound, outbound_rx) = mpsc::channel(config.publish_buffer);

        let instance_id = uuid::Uuid::new_v4().to_string();
        let reply_subject = format!("{}.{}", config.reply_queue, instance_id);

        let state = Self {
            config,
            registry,
            routes,
            verifier,
            outbound,
            reply_subject,
            instance_id,
            metrics: GatewayMetrics::default(),
            shutdown,
        };
        Ok((state, outbound_rx))
    }
}
