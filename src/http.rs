//! Shared JSON-over-HTTP client for the upstream providers

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::{Result, RoutecastError};

/// Responses slower than this are logged as warnings.
const SLOW_RESPONSE: Duration = Duration::from_secs(5);

/// Transport settings for one provider
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    /// Zero disables the retry middleware entirely
    pub max_retries: u32,
    pub user_agent: String,
}

/// HTTP client bound to a single upstream service
#[derive(Clone)]
pub struct HttpClient {
    client: ClientWithMiddleware,
    service: &'static str,
}

impl HttpClient {
    pub fn new(service: &'static str, settings: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| RoutecastError::config(format!("Failed to create HTTP client: {e}")))?;

        let mut builder = ClientBuilder::new(client);
        if settings.max_retries > 0 {
            let policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy(policy));
        }

        Ok(Self {
            client: builder.build(),
            service,
        })
    }

    /// GET `url` and decode the JSON body.
    ///
    /// 404 maps to `NotFound`, any other non-2xx status or an undecodable
    /// body to `Upstream`.
    #[instrument(
        level = "debug",
        skip(self, url),
        fields(service = self.service, url = %redact(url))
    )]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!("HTTP {} in {:.3}s", status, start.elapsed().as_secs_f64());

        if status == StatusCode::NOT_FOUND {
            return Err(RoutecastError::not_found(format!(
                "{} has no data for this request",
                self.service
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RoutecastError::upstream(format!(
                "{} request failed with status {}: {}",
                self.service,
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            RoutecastError::upstream(format!("Invalid {} response: {e}", self.service))
        })?;

        let elapsed = start.elapsed();
        if elapsed > SLOW_RESPONSE {
            warn!(
                "Slow {} response: {:.3}s",
                self.service,
                elapsed.as_secs_f64()
            );
        }
        Ok(parsed)
    }
}

/// Strip the API key from a URL before it reaches the logs.
fn redact(url: &str) -> &str {
    url.split("key=").next().unwrap_or(url)
}
