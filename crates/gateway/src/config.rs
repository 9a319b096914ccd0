// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway process configuration: the orchestrator flags plus the bind
//! address and optional auth token for the HTTP+WebSocket boundary.

use clap::Parser;
use legion_core::config::OrchestratorConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "legiond", about = "Multi-session browser-automation orchestrator daemon")]
pub struct GatewayConfig {
    #[command(flatten)]
    pub orchestrator: OrchestratorConfig,

    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "LEGIOND_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8700, env = "LEGIOND_PORT")]
    pub port: u16,

    /// Bearer token required on `/api/v1/*` requests. If unset, auth is disabled.
    #[arg(long, env = "LEGIOND_AUTH_TOKEN")]
    pub auth_token: Option<String>,
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
