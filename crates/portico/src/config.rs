// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use crate::routes::RouteTable;

/// Configuration for the portico gateway.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "portico", about = "HTTP to message-broker API gateway", version)]
pub struct GatewayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "PORTICO_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "PORTICO_PORT")]
    pub port: u16,

    /// HMAC-SHA256 secret for bearer tokens (at least 32 bytes).
    #[arg(long, env = "PORTICO_JWT_SECRET")]
    pub jwt_secret: String,

    /// Expiry applied to tokens the gateway signs, in seconds.
    #[arg(long, default_value_t = 3600, env = "PORTICO_JWT_EXPIRATION_SECS")]
    pub jwt_expiration_secs: u64,

    /// Master switch for the broker publisher and reply listener.
    #[arg(
        long,
        default_value_t = true,
        env = "PORTICO_BROKER_ENABLED",
        action = clap::ArgAction::Set
    )]
    pub broker_enabled: bool,

    /// Broker server URL.
    #[arg(long, default_value = "nats://127.0.0.1:4222", env = "PORTICO_BROKER_URL")]
    pub broker_url: String,

    /// Subject prefix for service requests (the services exchange).
    #[arg(long, default_value = "services.exchange", env = "PORTICO_SERVICES_EXCHANGE")]
    pub services_exchange: String,

    /// Base name of the inbound reply subject; the instance id is appended so
    /// replicas never steal each other's replies.
    #[arg(long, default_value = "gateway.reply", env = "PORTICO_REPLY_QUEUE")]
    pub reply_queue: String,

    /// Per-request reply deadline in milliseconds.
    #[arg(long, default_value_t = 30_000, env = "PORTICO_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: u64,

    /// Max buffered request body in bytes.
    #[arg(long, default_value_t = 10 * 1024 * 1024, env = "PORTICO_MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Ceiling on concurrently awaited replies. 0 disables the cap.
    #[arg(long, default_value_t = 0, env = "PORTICO_MAX_IN_FLIGHT")]
    pub max_in_flight: usize,

    /// Capacity of the outbound publish buffer; a full buffer fails requests
    /// fast with 503.
    #[arg(long, default_value_t = 256, env = "PORTICO_PUBLISH_BUFFER")]
    pub publish_buffer: usize,

    /// Route table entries as `/prefix=routing.key`; empty uses the built-in
    /// table.
    #[arg(long = "route", env = "PORTICO_ROUTES", value_delimiter = ',')]
    pub routes: Vec<String>,

    /// Emit JSON log lines instead of human-readable ones.
    #[arg(long, default_value_t = false, env = "PORTICO_LOG_JSON")]
    pub log_json: bool,
}

impl GatewayConfig {
    /// Reject unusable configuration before anything is started.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt_secret.len() < 32 {
            anyhow::bail!("jwt secret must be at least 32 bytes");
        }
        if self.publish_buffer == 0 {
            anyhow::bail!("publish buffer must be at least 1");
        }
        self.route_table()?;
        Ok(())
    }

    pub fn route_table(&self) -> anyhow::Result<RouteTable> {
        RouteTable::from_specs(&self.routes)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }
}
