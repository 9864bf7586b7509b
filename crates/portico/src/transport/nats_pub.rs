// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker publisher for outbound request envelopes.
//!
//! Drains the bounded outbound buffer filled by the bridge and publishes each
//! envelope to `{services_exchange}.{routing_key}` with the gateway's reply
//! subject and the correlation headers set. Once the broker has accepted a
//! message the publish is not cancellable; a failed publish is logged and the
//! waiting request runs into its deadline.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::OutboundMessage;
use crate::transport::trace::CORRELATION_HEADER;

/// Header carrying the optional trace id.
pub const TRACE_HEADER: &str = "traceId";

/// Connect to the broker. Startup fails (non-zero exit) when the broker is
/// unreachable.
pub async fn connect(url: &str) -> anyhow::Result<async_nats::Client> {
    info!(url = %url, "connecting to broker");
    let client = async_nats::ConnectOptions::new().connect(url).await?;
    info!("broker connected");
    Ok(client)
}

/// Publishes request envelopes from the outbound buffer to the services
/// exchange.
pub struct RequestPublisher {
    client: async_nats::Client,
    exchange: String,
    reply_subject: String,
}

impl RequestPublisher {
    pub fn new(client: async_nats::Client, exchange: String, reply_subject: String) -> Self {
        Self { client, exchange, reply_subject }
    }

    /// Run the publisher loop until the buffer closes or shutdown fires.
    pub async fn run(
        self,
        mut outbound_rx: mpsc::Receiver<OutboundMessage>,
        shutdown: CancellationToken,
    ) {
        loop {
            tokio::select! {
                msg = outbound_rx.recv() => {
                    let Some(msg) = msg else { break };
                    self.publish(msg).await;
                }
                _ = shutdown.cancelled() => break,
            }
        }
        debug!("request publisher shutting down");
    }

    async fn publish(&self, msg: OutboundMessage) {
        let subject = format!("{}.{}", self.exchange, msg.routing_key);

        let mut headers = async_nats::HeaderMap::new();
        headers.insert(CORRELATION_HEADER, msg.correlation_id.as_str());
        if let Some(ref trace_id) = msg.trace_id {
            headers.insert(TRACE_HEADER, trace_id.as_str());
        }

        if let Err(e) = self
            .client
            .publish_with_reply_and_headers(
                subject,
                self.reply_subject.clone(),
                headers,
                msg.payload,
            )
            .await
        {
            warn!(correlation_id = %msg.correlation_id, err = %e, "publish failed");
        }
    }
}
