//! Environment overlay. Values found here replace whatever the config file set.

use super::data::Config;
use crate::core::search::GatewayKind;

pub const BASE_URL_ENV: &str = "BASE_URL";
pub const MODEL_NAME_ENV: &str = "MODEL_NAME";
pub const API_KEY_ENV: &str = "API_KEY";

impl Config {
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overlays values from `lookup`; blank values count as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let overlays: [(&str, &mut Option<String>); 5] = [
            (BASE_URL_ENV, &mut self.base_url),
            (MODEL_NAME_ENV, &mut self.model),
            (API_KEY_ENV, &mut self.api_key),
            (GatewayKind::Local.env_var(), &mut self.local_mcp_host),
            (GatewayKind::Remote.env_var(), &mut self.remote_mcp_host),
        ];
        for (name, slot) in overlays {
            if let Some(value) = read(name) {
                *slot = Some(value);
            }
        }
    }

    /// Names of required settings that are still unset.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.base_url().is_none() {
            missing.push(BASE_URL_ENV);
        }
        if self.model().is_none() {
            missing.push(MODEL_NAME_ENV);
        }
        for kind in [GatewayKind::Local, GatewayKind::Remote] {
            if self.endpoint(kind).is_none() {
                missing.push(kind.env_var());
            }
        }
        missing
    }
}
