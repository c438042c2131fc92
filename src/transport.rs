use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client as ReqwestClient;

use crate::{Error, Result, SignedRequest};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Raw reply of the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new<T>(status: u16, body: T) -> Self
    where
        T: Into<String>,
    {
        TransportResponse {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Text describing a failed reply: the trimmed body, or the status code
    /// when the body is empty.
    pub(crate) fn failure_text(&self) -> String {
        let body = self.body.trim();
        if body.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            body.to_string()
        }
    }
}

/// Delivers a [`SignedRequest`] and hands back the raw reply.
///
/// Failures to connect, time out and the like are reported as
/// [`Error::Transport`] and passed through untouched.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    inner: ReqwestClient,
}

impl ReqwestTransport {
    /// Constructs a new `ReqwestTransport`.
    ///
    /// This method calls reqwest::Client::new() internally.
    pub fn new() -> Self {
        ReqwestTransport {
            inner: ReqwestClient::new(),
        }
    }

    /// Constructs a transport whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let inner = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {}", e)))?;
        Ok(ReqwestTransport { inner })
    }

    /// Constructs a transport with specifying inner `reqwest::Client`.
    pub fn new_with_client(client: ReqwestClient) -> Self {
        ReqwestTransport { inner: client }
    }
}

impl From<ReqwestClient> for ReqwestTransport {
    fn from(client: ReqwestClient) -> Self {
        ReqwestTransport::new_with_client(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: SignedRequest) -> Result<TransportResponse> {
        let mut builder = self
            .inner
            .request(request.method().clone(), request.url().clone());
        if let Some(authorization) = request.authorization() {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = request.body() {
            builder = builder
                .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                .body(body.to_string());
        }
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
