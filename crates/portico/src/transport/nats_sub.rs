// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply listener: consumes the gateway's inbound reply subject and fans
//! replies out to waiting request tasks through the correlation registry.
//!
//! Deliveries are acknowledged unconditionally (core NATS delivers without
//! redelivery); the gateway never retries a reply. Malformed payloads are
//! logged and dropped without completing any slot.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::envelope::ResponseEnvelope;
use crate::registry::CompleteOutcome;
use crate::state::GatewayState;
use crate::transport::trace::CORRELATION_HEADER;

/// Spawn the reply listener as a background task.
pub fn spawn_reply_listener(state: Arc<GatewayState>, client: async_nats::Client) {
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = run_listener(state, client, shutdown).await {
            error!(err = %e, "reply listener failed");
        }
    });
}

async fn run_listener(
    state: Arc<GatewayState>,
    client: async_nats::Client,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let subject = state.reply_subject.clone();
    let mut sub = client.subscribe(subject.clone()).await?;
    info!(subject = %subject, "reply listener subscribed");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            msg = sub.next() => {
                let Some(msg) = msg else { break };
                let Some((id, envelope)) = decode_reply(&msg.payload, msg.headers.as_ref()) else {
                    continue;
                };
                match state.registry.complete(&id, envelope) {
                    CompleteOutcome::Delivered => {
                        debug!(correlation_id = %id, "reply delivered");
                    }
                    CompleteOutcome::Orphan => {
                        warn!(correlation_id = %id, "orphan reply dropped");
                    }
                    CompleteOutcome::LateCompletion => {
                        debug!(correlation_id = %id, "late reply dropped");
                    }
                }
            }
        }
    }

    debug!("reply listener shutting down");
    Ok(())
}

/// Decode a delivery into `(correlation id, envelope)`.
///
/// The id comes from the `correlationId` message header when present, falling
/// back to the envelope's own field. `None` means the payload was malformed.
fn decode_reply(
    payload: &[u8],
    headers: Option<&async_nats::HeaderMap>,
) -> Option<(String, ResponseEnvelope)> {
    let envelope: ResponseEnvelope = match serde_json::from_slice(payload) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(err = %e, "malformed reply payload, dropping");
            return None;
        }
    };
    let id = headers
        .and_then(|headers| headers.get(CORRELATION_HEADER))
        .map(|value| value.as_str().to_owned())
        .unwrap_or_else(|| envelope.correlation_id.clone());
    Some((id, envelope))
}

#[cfg(test)]
#[path = "nats_sub_tests.rs"]
mod tests;
