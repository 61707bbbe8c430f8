// HTTP client configuration and utilities

use crate::error::{ResolveError, Result};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub user_agent: String,
    pub redirects: u32,
    /// Extra attempts after a transport failure
    pub retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            write_timeout: Duration::from_secs(30),
            user_agent: "Mozilla/5.0 (compatible; VoiceBubble/0.1)".to_string(),
            redirects: 10,
            retries: 2,
        }
    }
}

/// Create a configured HTTP agent with proper timeouts and settings
pub fn create_http_agent(config: &HttpConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(config.connect_timeout)
        .timeout_read(config.read_timeout)
        .timeout_write(config.write_timeout)
        .user_agent(&config.user_agent)
        .redirects(config.redirects)
        .build()
}

/// Only plain web URLs are fetched
pub fn ensure_http_url(url: &str) -> Result<()> {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(())
    } else {
        Err(ResolveError::InvalidUrl(url.to_string()))
    }
}

/// GET `url`, retrying transport failures with exponential backoff.
/// Status errors are returned at once.
pub fn get_with_retries(agent: &ureq::Agent, url: &str, max_retries: u32) -> Result<ureq::Response> {
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match agent.get(url).call() {
            Ok(response) => return Ok(response),
            Err(ureq::Error::Status(code, _)) => return Err(ResolveError::HttpStatus(code)),
            Err(e) => {
                last_error = Some(e.to_string());
                if attempt < max_retries {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    log::warn!("Request failed (attempt {}), retrying after {:?}", attempt + 1, delay);
                    std::thread::sleep(delay);
                }
            }
        }
    }

    Err(ResolveError::Network(format!(
        "Request failed after {} attempts: {}",
        max_retries + 1,
        last_error.unwrap_or_default()
    )))
}
