//! The reqwest-backed implementation of [`HttpPort`] (C3).
//!
//! Redirects are followed by reqwest's default client policy. Transient
//! failures (network errors, 5xx responses) are retried with exponential
//! backoff (base 1s, cap 4s, up to `retries` total attempts); 4xx responses
//! return immediately since retrying them never helps.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::NetworkError;
use crate::ports::http::{GetResult, HeadResult, Headers, HttpPort, StreamResult};

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(4);

pub struct ReqwestHttpClient {
    client: Client,
    head_timeout: Duration,
    get_timeout: Duration,
    retries: u32,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: &str, head_timeout: Duration, get_timeout: Duration, retries: u32, verify_tls: bool) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .brotli(true)
            .danger_accept_invalid_certs(!verify_tls)
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            head_timeout,
            get_timeout,
            retries: retries.max(1),
        }
    }

    fn backoff_delay(attempt: u32) -> Duration {
        let exp = BACKOFF_BASE.saturating_mul(1u32 << attempt.min(4));
        exp.min(BACKOFF_CAP)
    }

    fn is_retryable_status(status: StatusCode) -> bool {
        status.is_server_error()
    }

    fn classify_reqwest_error(url: &str, timeout: Duration, err: &reqwest::Error) -> NetworkError {
        if err.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }
        } else if let Some(status) = err.status() {
            NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_connect() || err.is_request() {
            NetworkError::Request {
                url: url.to_string(),
                message: err.to_string(),
            }
        } else {
            NetworkError::Other {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }

    fn collect_headers(response: &reqwest::Response) -> Headers {
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(name.as_str(), v);
            }
        }
        headers
    }
}

#[async_trait]
impl HttpPort for ReqwestHttpClient {
    async fn head(&self, url: &str) -> Result<HeadResult, NetworkError> {
        let mut last_err = None;
        for attempt in 0..self.retries {
            let result = self
                .client
                .head(url)
                .timeout(self.head_timeout)
                .send()
                .await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if Self::is_retryable_status(status) && attempt + 1 < self.retries {
                        debug!(url, %status, attempt, "HEAD retryable status, backing off");
                        tokio::time::sleep(Self::backoff_delay(attempt)).await;
                        continue;
                    }
                    let headers = Self::collect_headers(&response);
                    return Ok(HeadResult {
                        status: status.as_u16(),
                        headers,
                    });
                }
                Err(err) => {
                    let classified = Self::classify_reqwest_error(url, self.head_timeout, &err);
                    let retryable = matches!(classified, NetworkError::Timeout { .. } | NetworkError::Other { .. });
                    last_err = Some(classified);
                    if retryable && attempt + 1 < self.retries {
                        tokio::time::sleep(Self::backoff_delay(attempt)).await;
                        continue;
                    }
                    break;
                }
            }
        }
        Err(last_err.unwrap_or(NetworkError::Other {
            url: url.to_string(),
            message: "exhausted retries".to_string(),
        }))
    }

    async fn get(&self, url: &str) -> Result<GetResult, NetworkError> {
        let mut last_err = None;
        for attempt in 0..self.retries {
            let result = self.client.get(url).timeout(self.get_timeout).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();
                    if Self::is_retryable_status(status) && attempt + 1 < self.retries {
                        debug!(url, %status, attempt, "GET retryable status, backing off");
                        tokio::time::sleep(Self::backoff_delay(attempt)).await;
                        continue;
                    }
                    let headers = Self::collect_headers(&response);
                    let body = response
                        .bytes()
                        .await
                        .map_err(|e| Self::classify_reqwest_error(url, self.get_timeout, &e))?;
                    return Ok(GetResult {
                        status: status.as_u16(),
                        headers,
                        body,
                    });
                }
                Err(err) => {
                    let classified = Self::classify_reqwest_error(url, self.get_timeout, &err);
                    let retryable = matches!(classified, NetworkError::Timeout { .. } | NetworkError::Other { .. });
                    last_err = Some(classified);
                    if retryable && attempt + 1 < self.retries {
                        tokio::time::sleep(Self::backoff_delay(attempt)).await;
                        continue;
                    }
                    break;
                }
            }
        }
        Err(last_err.unwrap_or(NetworkError::Other {
            url: url.to_string(),
            message: "exhausted retries".to_string(),
        }))
    }

    async fn stream(&self, url: &str) -> Result<StreamResult, NetworkError> {
        let response = self
            .client
            .get(url)
            .timeout(self.get_timeout)
            .send()
            .await
            .map_err(|e| Self::classify_reqwest_error(url, self.get_timeout, &e))?;

        let status = response.status();
        if Self::is_retryable_status(status) || status.is_client_error() {
            return Err(NetworkError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let headers = Self::collect_headers(&response);
        let url_owned = url.to_string();
        let byte_stream = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| NetworkError::Request {
                url: url_owned.clone(),
                message: e.to_string(),
            })
        });

        Ok(StreamResult {
            status: status.as_u16(),
            headers,
            chunks: Box::pin(byte_stream),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_cap() {
        assert_eq!(ReqwestHttpClient::backoff_delay(0), Duration::from_secs(1));
        assert_eq!(ReqwestHttpClient::backoff_delay(1), Duration::from_secs(2));
        assert_eq!(ReqwestHttpClient::backoff_delay(2), Duration::from_secs(4));
        assert_eq!(ReqwestHttpClient::backoff_delay(3), Duration::from_secs(4));
    }
}
