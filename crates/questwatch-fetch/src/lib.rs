//! Questwatch Fetch - Retrieval of the tracked page.
//!
//! A thin wrapper over `reqwest` that applies the configured timeout and
//! user agent and turns a non-success status into an error. One fetch per
//! cycle; the cycle cannot proceed to extraction until it completes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;

pub use error::{FetchError, Result};

use questwatch_core::FetchConfig;
use std::time::Duration;

/// HTTP client for the tracked page.
#[derive(Debug, Clone)]
pub struct PageClient {
    client: reqwest::Client,
}

impl PageClient {
    /// Build a client from the fetch configuration.
    ///
    /// # Errors
    /// Returns `FetchError::Request` if the underlying client cannot be
    /// constructed.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client })
    }

    /// Fetch the page body as text.
    ///
    /// # Errors
    /// Returns `FetchError::Request` on transport failure and
    /// `FetchError::Status` on a non-success response.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        tracing::debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
