//! reqwest-backed implementation of the core transport contract

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method};
use wikiact_core::sanitization::sanitize_response;
use wikiact_core::{ApiRequest, CoreResult, HttpMethod, Transport, DEFAULT_API_PATH};

use crate::connection::WikiConnection;
use crate::error::{ConnectorError, ConnectorResult};
use crate::retry_manager::{RetryDecision, RetryManager};
use crate::timeout_manager::TimeoutManager;
use crate::url_builder::UrlBuilder;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const ERROR_BODY_PREVIEW: usize = 256;

/// Sends API requests to one wiki over HTTP.
///
/// The client keeps cookies, so a login session carries over to later
/// requests. GET parameters travel in the query string, POST parameters as
/// a form body. Requests addressed to the default API path go to the
/// configured endpoint; any other path is joined to the host URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    connection: WikiConnection,
    endpoint: String,
    timeout_manager: TimeoutManager,
    retry_manager: RetryManager,
}

impl HttpTransport {
    pub fn new(connection: WikiConnection) -> ConnectorResult<Self> {
        connection.validate()?;
        let endpoint = connection.endpoint()?;
        let timeout_manager = TimeoutManager::new(connection.timeout_config.clone());
        let retry_manager = RetryManager::new(connection.retry_policy.clone());

        let client = timeout_manager
            .apply_to_client_builder(Client::builder())
            .user_agent(connection.user_agent.clone())
            .cookie_store(true)
            .build()?;

        tracing::debug!(endpoint = %endpoint, "Created HTTP transport");

        Ok(Self {
            client,
            connection,
            endpoint,
            timeout_manager,
            retry_manager,
        })
    }

    pub fn connection(&self) -> &WikiConnection {
        &self.connection
    }

    /// Absolute URL of the API endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url_for(&self, request: &ApiRequest) -> ConnectorResult<String> {
        if request.path() == DEFAULT_API_PATH {
            Ok(self.endpoint.clone())
        } else {
            UrlBuilder::join(&self.connection.base_url, request.path())
        }
    }

    /// Send with the configured retry policy. POST requests are retried only
    /// when the policy opts in.
    pub async fn execute(&self, request: &ApiRequest) -> ConnectorResult<String> {
        let start_time = Instant::now();
        let may_retry =
            request.method() == HttpMethod::Get || self.connection.retry_policy.retry_post;
        let mut attempt = 0;

        loop {
            let error = match self.execute_once(request).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            if !may_retry {
                return Err(error);
            }

            match self.retry_manager.should_retry(&error, attempt, start_time) {
                RetryDecision::Retry { delay, attempt: next } => {
                    tracing::warn!(
                        attempt = next,
                        delay_ms = elapsed_ms(delay),
                        error = %error,
                        "Retrying request"
                    );
                    attempt = next;
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop { reason, retries } => {
                    if retries == 0 {
                        return Err(error);
                    }
                    return Err(ConnectorError::RetriesExhausted {
                        reason,
                        source: Box::new(error),
                    });
                }
            }
        }
    }

    /// One exchange without retry.
    pub async fn execute_once(&self, request: &ApiRequest) -> ConnectorResult<String> {
        let start_time = Instant::now();
        let url = self.url_for(request)?;
        let encoded = request.encoded_params();

        let builder = match request.method() {
            HttpMethod::Get => {
                let full = if encoded.is_empty() {
                    url
                } else {
                    format!("{}?{}", url, encoded)
                };
                self.client.request(Method::GET, full)
            }
            HttpMethod::Post => self
                .client
                .request(Method::POST, url)
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(encoded),
        };

        let (status, retry_after, body) = self
            .timeout_manager
            .execute_with_timeout(async {
                let response = builder.send().await?;
                let status = response.status();
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                let body = response.text().await?;
                Ok((status, retry_after, body))
            })
            .await?;

        tracing::debug!(
            method = request.method().as_str(),
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = elapsed_ms(start_time.elapsed()),
            "Received response"
        );

        if !status.is_success() {
            return Err(ConnectorError::Status {
                status: status.as_u16(),
                body: sanitize_response(&body, ERROR_BODY_PREVIEW),
                retry_after,
            });
        }
        Ok(body)
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    elapsed.as_millis() as u64
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> CoreResult<String> {
        Ok(self.execute(request).await?)
    }
}
