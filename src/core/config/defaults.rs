use super::data::{non_blank, Config};
use crate::core::search::{GatewayEndpoints, GatewayKind};
use std::time::Duration;

pub const DEFAULT_HISTORY_WINDOW: usize = 6;
pub const DEFAULT_TRUNCATION_BUDGET: usize = 8000;
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;

impl Config {
    pub fn base_url(&self) -> Option<&str> {
        non_blank(&self.base_url)
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(&self.model)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_blank(&self.api_key)
    }

    pub fn protocol_version(&self) -> Option<&str> {
        non_blank(&self.protocol_version)
    }

    pub fn endpoint(&self, kind: GatewayKind) -> Option<&str> {
        match kind {
            GatewayKind::Local => non_blank(&self.local_mcp_host),
            GatewayKind::Remote => non_blank(&self.remote_mcp_host),
        }
    }

    pub fn gateway_endpoints(&self) -> GatewayEndpoints {
        GatewayEndpoints {
            local: self.endpoint(GatewayKind::Local).map(str::to_string),
            remote: self.endpoint(GatewayKind::Remote).map(str::to_string),
        }
    }

    pub fn history_window(&self) -> usize {
        self.history_window.unwrap_or(DEFAULT_HISTORY_WINDOW)
    }

    pub fn truncation_budget(&self) -> usize {
        self.truncation_budget.unwrap_or(DEFAULT_TRUNCATION_BUDGET)
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(
            self.gateway_timeout_secs
                .unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS),
        )
    }

    pub fn resolve_tool_synonyms(&self) -> bool {
        self.resolve_tool_synonyms.unwrap_or(false)
    }

    pub fn show_sources(&self) -> bool {
        self.show_sources.unwrap_or(true)
    }
}
