//! Shared HTTP client construction for the external services

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("FoodieTour/", env!("CARGO_PKG_VERSION"));

/// Builds a client with a request timeout and transient-error retries.
/// `max_retries == 0` sends every request exactly once.
pub fn build_client(
    timeout: Duration,
    max_retries: u32,
    user_agent: &str,
) -> Result<ClientWithMiddleware> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
        .with_context(|| "Failed to create HTTP client")?;

    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Strips trailing slashes so paths can be appended with `format!`
#[must_use]
pub fn trim_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base_url() {
        assert_eq!(trim_base_url("https://api.unsplash.com/"), "https://api.unsplash.com");
        assert_eq!(trim_base_url("http://localhost:8080"), "http://localhost:8080");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(3), 0, USER_AGENT).is_ok());
    }
}
