use super::data::Config;
use super::defaults::{
    DEFAULT_GATEWAY_TIMEOUT_SECS, DEFAULT_HISTORY_WINDOW, DEFAULT_TRUNCATION_BUDGET,
};
use super::io::ConfigError;
use crate::core::search::{GatewayEndpoints, GatewayKind};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent_config.toml");

    let config = Config::load_from_path(&config_path).expect("missing file should load");
    assert_eq!(config, Config::default());
}

#[test]
fn load_reads_every_setting_from_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
base_url = "http://localhost:11434/v1"
model = "llama3"
local_mcp_host = "http://localhost:9011"
remote_mcp_host = "https://gateway.example.org/mcp"
history_window = 10
truncation_budget = 4000
gateway_timeout_secs = 5
protocol_version = "2025-06-18"
resolve_tool_synonyms = true
show_sources = false
"#,
    )
    .expect("write config");

    let config = Config::load_from_path(&config_path).expect("config should parse");
    assert_eq!(config.base_url(), Some("http://localhost:11434/v1"));
    assert_eq!(config.model(), Some("llama3"));
    assert_eq!(config.history_window(), 10);
    assert_eq!(config.truncation_budget(), 4000);
    assert_eq!(config.gateway_timeout(), Duration::from_secs(5));
    assert_eq!(config.protocol_version(), Some("2025-06-18"));
    assert!(config.resolve_tool_synonyms());
    assert!(!config.show_sources());
    assert_eq!(
        config.gateway_endpoints(),
        GatewayEndpoints {
            local: Some("http://localhost:9011".to_string()),
            remote: Some("https://gateway.example.org/mcp".to_string()),
        }
    );
}

#[test]
fn invalid_toml_reports_parse_error_with_path() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "history_window = \"six\"\n").expect("write config");

    let err = Config::load_from_path(&config_path).expect_err("bad type should fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().starts_with("Failed to parse config at "));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn zero_history_window_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "history_window = 0\n").expect("write config");

    let err = Config::load_from_path(&config_path).expect_err("zero window should fail");
    assert!(matches!(
        err,
        ConfigError::Invalid {
            key: "history_window",
            ..
        }
    ));
    assert!(err
        .to_string()
        .ends_with("history_window must be at least 1"));
}

#[test]
fn defaults_apply_when_unset() {
    let config = Config::default();
    assert_eq!(config.history_window(), DEFAULT_HISTORY_WINDOW);
    assert_eq!(config.truncation_budget(), DEFAULT_TRUNCATION_BUDGET);
    assert_eq!(
        config.gateway_timeout(),
        Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS)
    );
    assert!(!config.resolve_tool_synonyms());
    assert!(config.show_sources());
    assert_eq!(config.protocol_version(), None);
}

#[test]
fn environment_overrides_file_values() {
    let mut config = Config {
        base_url: Some("http://file/v1".to_string()),
        model: Some("file-model".to_string()),
        local_mcp_host: Some("http://file-local".to_string()),
        ..Default::default()
    };

    config.apply_env_with(lookup_from(&[
        ("BASE_URL", "http://env/v1"),
        ("REMOTE_MCP_HOST", "http://env-remote"),
        ("API_KEY", "sk-test"),
    ]));

    assert_eq!(config.base_url(), Some("http://env/v1"));
    assert_eq!(config.model(), Some("file-model"));
    assert_eq!(config.api_key(), Some("sk-test"));
    assert_eq!(config.endpoint(GatewayKind::Local), Some("http://file-local"));
    assert_eq!(config.endpoint(GatewayKind::Remote), Some("http://env-remote"));
}

#[test]
fn blank_values_count_as_unset() {
    let mut config = Config {
        model: Some("file-model".to_string()),
        local_mcp_host: Some("   ".to_string()),
        ..Default::default()
    };

    config.apply_env_with(lookup_from(&[("MODEL_NAME", ""), ("BASE_URL", "  ")]));

    assert_eq!(config.model(), Some("file-model"));
    assert_eq!(config.base_url(), None);
    assert_eq!(config.endpoint(GatewayKind::Local), None);
}

#[test]
fn missing_settings_lists_required_names() {
    let config = Config {
        model: Some("llama3".to_string()),
        local_mcp_host: Some("http://localhost:9011".to_string()),
        ..Default::default()
    };
    assert_eq!(
        config.missing_settings(),
        vec!["BASE_URL", "REMOTE_MCP_HOST"]
    );

    let mut complete = config.clone();
    complete.apply_env_with(lookup_from(&[
        ("BASE_URL", "http://localhost:11434/v1"),
        ("REMOTE_MCP_HOST", "https://gateway.example.org/mcp"),
    ]));
    assert!(complete.missing_settings().is_empty());
}
