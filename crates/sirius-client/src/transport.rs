// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP transport seam.
//
// `HttpTransport` performs exactly one exchange and reports what happened
// without interpreting it.  `ReqwestTransport` is the production
// implementation; tests substitute their own.

use std::error::Error as StdError;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use tracing::{debug, instrument};

use sirius_core::error::{Result, SiriusError};
use sirius_core::types::{
    HttpMethod, HttpRequest, TransferOutcome, TransportErrorKind, TransportFailure,
};

/// A single-request HTTP channel.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform `request` once.  Never retries.
    async fn execute(&self, request: HttpRequest) -> TransferOutcome;
}

/// `reqwest`-backed transport.  Cloning shares the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with transport-default timeouts.
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|err| SiriusError::Transport(transport_failure(&err)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip_all, fields(method = request.method.as_str(), url = %request.url))]
    async fn execute(&self, request: HttpRequest) -> TransferOutcome {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, request.url);
        if let Some(content_type) = request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type.mime_type());
        }
        if request.method == HttpMethod::Post {
            builder = builder.body(request.body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return TransferOutcome::Failed(transport_failure(&err)),
        };

        let status = response.status().as_u16();
        debug!(status, "response received");

        match response.bytes().await {
            Ok(body) => TransferOutcome::Response {
                status,
                body: Some(body.to_vec()),
            },
            Err(err) => TransferOutcome::Failed(transport_failure(&err)),
        }
    }
}

/// Describe a reqwest error, keeping its full source chain.
pub fn transport_failure(err: &reqwest::Error) -> TransportFailure {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Body
    } else if err.is_request() || err.is_builder() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    };

    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }

    TransportFailure::new(kind, detail)
}
