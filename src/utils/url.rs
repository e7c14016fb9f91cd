//! Joining configured base URLs with API paths.

/// Strips trailing slashes so a path can be appended without doubling them.
///
/// ```
/// use searchlight::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434/v1/"), "http://localhost:11434/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Joins a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use searchlight::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434/v1/", "/chat/completions"),
///     "http://localhost:11434/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}
