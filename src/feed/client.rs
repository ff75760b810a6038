//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Optional feed credential sent with every request
//! - Exponential backoff retry logic (max 3 retries)
//! - Rate limit, not-found, and authentication error mapping

use crate::error::FeedError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("feedup/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// User name sent with basic auth; authenticated feeds only check the token
const CREDENTIAL_USER: &str = "feedup";

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
    credential: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, FeedError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FeedError::Network {
                package: String::new(),
                feed: "HTTP client".to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
            credential: None,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Attach a credential (API key or personal access token)
    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential;
        self
    }

    /// Returns true when a credential is attached
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credential {
            Some(token) => request
                .basic_auth(CREDENTIAL_USER, Some(token))
                .header("X-NuGet-ApiKey", token),
            None => request,
        }
    }

    /// Perform a GET request with retry logic and error context
    pub async fn get_with_context(
        &self,
        url: &str,
        package: &str,
        feed: &str,
    ) -> Result<Response, FeedError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match self.authorize(self.client.get(url)).send().await {
                Ok(response) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(FeedError::RateLimitExceeded {
                            feed: feed.to_string(),
                        });

                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                            continue;
                        }
                        break;
                    }

                    return check_status(response, package, feed);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(FeedError::Timeout {
                            package: package.to_string(),
                            feed: feed.to_string(),
                        });
                    } else {
                        last_error = Some(FeedError::network(package, feed, e.to_string()));
                    }

                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FeedError::network(package, feed, "unknown error")))
    }

    /// Perform a GET request and parse the JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        feed: &str,
    ) -> Result<T, FeedError> {
        let response = self.get_with_context(url, package, feed).await?;
        response.json::<T>().await.map_err(|e| {
            FeedError::invalid_response(package, feed, format!("failed to parse JSON: {}", e))
        })
    }

    /// Perform a GET request and return the body bytes
    pub async fn get_bytes(&self, url: &str, package: &str, feed: &str) -> Result<Vec<u8>, FeedError> {
        let response = self.get_with_context(url, package, feed).await?;
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FeedError::invalid_response(package, feed, e.to_string()))
    }

    /// Upload a package file as multipart form data (no retry; pushes are not idempotent)
    pub async fn put_package(
        &self,
        url: &str,
        file_name: String,
        content: Vec<u8>,
        package: &str,
        feed: &str,
    ) -> Result<Response, FeedError> {
        let part = reqwest::multipart::Part::bytes(content).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("package", part);

        self.authorize(self.client.put(url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout {
                        package: package.to_string(),
                        feed: feed.to_string(),
                    }
                } else {
                    FeedError::network(package, feed, e.to_string())
                }
            })
    }
}

/// Map non-success statuses to feed errors
pub(crate) fn check_status(response: Response, package: &str, feed: &str) -> Result<Response, FeedError> {
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        return Err(FeedError::package_not_found(package, feed));
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(FeedError::Authentication {
            feed: feed.to_string(),
            message: format!("HTTP {}", status),
        });
    }

    if !status.is_success() {
        return Err(FeedError::network(package, feed, format!("HTTP {}", status)));
    }

    Ok(response)
}
