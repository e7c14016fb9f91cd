//! Direct gateway access: `call` and `tools`

use std::error::Error;

use serde_json::{Map, Value};

use crate::core::config::Config;
use crate::core::search::GatewayKind;
use crate::mcp::client::GatewayClient;
use crate::mcp::error::GatewayError;

fn gateway_client(config: &Config) -> Result<GatewayClient, GatewayError> {
    GatewayClient::new(
        config.gateway_timeout(),
        config.protocol_version().map(str::to_string),
    )
}

pub(crate) fn parse_tool_arguments(raw: Option<&str>) -> Result<Map<String, Value>, String> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(_) => Err("Tool arguments must be a JSON object".to_string()),
        Err(err) => Err(format!("Invalid tool arguments: {err}")),
    }
}

/// Prints the tool's text, or the sentinel describing why there is none.
pub async fn run_call(
    config: &Config,
    gateway: GatewayKind,
    tool: &str,
    raw_arguments: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let arguments = parse_tool_arguments(raw_arguments)?;

    let text = match config.endpoint(gateway) {
        None => GatewayError::Unconfigured {
            setting: gateway.env_var(),
        }
        .sentinel(tool),
        Some(endpoint) => {
            let client = gateway_client(config)?;
            client
                .invoke(endpoint, tool, arguments)
                .await
                .unwrap_or_else(|err| err.sentinel(tool))
        }
    };

    println!("{text}");
    Ok(())
}

pub async fn run_tools(config: &Config, gateway: GatewayKind) -> Result<(), Box<dyn Error>> {
    let endpoint = config
        .endpoint(gateway)
        .ok_or(GatewayError::Unconfigured {
            setting: gateway.env_var(),
        })?;

    let names = gateway_client(config)?.list_tools(endpoint).await?;
    if names.is_empty() {
        println!("No tools offered by {endpoint}");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}
