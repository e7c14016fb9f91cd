use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read once at startup. Every field is optional; getters in
/// `defaults.rs` supply fallbacks and treat blank strings as unset.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI-compatible base URL, e.g. `http://localhost:11434/v1`.
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    /// MCP gateway serving the web search tool.
    pub local_mcp_host: Option<String>,
    /// MCP gateway serving the paper search tool.
    pub remote_mcp_host: Option<String>,
    /// Number of most recent turns included in each prompt.
    pub history_window: Option<usize>,
    /// Characters of tool output kept before truncation.
    pub truncation_budget: Option<usize>,
    pub gateway_timeout_secs: Option<u64>,
    pub protocol_version: Option<String>,
    pub resolve_tool_synonyms: Option<bool>,
    pub show_sources: Option<bool>,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/searchlight/config.toml` → `~/.config/searchlight/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
