//! Single-shot HTTP(S) retrieval for the fetch-then-parse helpers

use crate::config::FetchConfig;
use crate::error::NetworkError;

/// Create a configured ureq agent. Status codes are checked by the caller
/// so the reason phrase can be reported.
fn create_agent(config: &FetchConfig) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(config.timeout())
        .timeout_connect(Some(config.connect_timeout()))
        .http_status_as_error(false)
        .build()
        .new_agent()
}

/// GET `url` and return the raw body. One attempt, no retry.
pub fn fetch_bytes(url: &str, config: &FetchConfig) -> Result<Vec<u8>, NetworkError> {
    let agent = create_agent(config);
    let transport = |e: ureq::Error| NetworkError::Transport {
        url: url.to_string(),
        message: e.to_string(),
    };

    log::debug!("Fetching {}", url);
    let mut response = agent
        .get(url)
        .header("User-Agent", config.user_agent.as_str())
        .call()
        .map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
        return Err(NetworkError::Status {
            url: url.to_string(),
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
        });
    }

    let body = response
        .body_mut()
        .with_config()
        .limit(config.max_body_bytes)
        .read_to_vec()
        .map_err(transport)?;

    log::debug!("Fetched {} bytes from {}", body.len(), url);
    Ok(body)
}

/// GET `url` as UTF-8 text (invalid sequences replaced)
pub fn fetch_text(url: &str, config: &FetchConfig) -> Result<String, NetworkError> {
    let body = fetch_bytes(url, config)?;
    Ok(match String::from_utf8(body) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// True for sources that should be fetched rather than read from disk
pub fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
