// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Sirius printer client.

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{Result, SiriusError};

/// Sender name used when the supplied identity escapes to nothing.
pub const ANONYMOUS_SENDER: &str = "anon";

/// Unique identifier for a single dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque printer key.  The key is itself the URL of the printer: POSTing to
/// it delivers a message, GETting it returns the printer's info document.
///
/// The original text is kept verbatim because message URLs are composed by
/// appending to it, not by editing the parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterKey {
    raw: String,
    url: Url,
}

impl PrinterKey {
    /// Validate `key` as a URL.
    pub fn parse(key: &str) -> Result<Self> {
        let url = Url::parse(key).map_err(|_| SiriusError::InvalidUrl)?;
        Ok(Self {
            raw: key.to_owned(),
            url,
        })
    }

    /// The key exactly as supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed info URL.
    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl FromStr for PrinterKey {
    type Err = SiriusError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PrinterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Display name attached to outgoing messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderIdentity(String);

impl SenderIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// Percent-escaped form suitable for the `from` query parameter.
    ///
    /// Only ASCII alphanumerics and `-_.~` survive unescaped, so reserved
    /// characters (`&`, `=`, `#`, `?`, `/`, ...) can never leak into the URL
    /// structure.  An empty result falls back to [`ANONYMOUS_SENDER`].
    pub fn escaped(&self) -> Cow<'_, str> {
        let escaped = urlencoding::encode(&self.0);
        if escaped.is_empty() {
            Cow::Borrowed(ANONYMOUS_SENDER)
        } else {
            escaped
        }
    }
}

impl From<&str> for SenderIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for SenderIdentity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Content-Type labels the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    PlainText,
    Html,
    Jpeg,
    Png,
}

impl ContentType {
    /// MIME type string for the `Content-Type` header.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::PlainText => "text/plain",
            Self::Html => "text/html",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Header label applied to image messages.
///
/// Image bodies are always PNG.  Deployed servers have historically received
/// them labelled `image/jpeg`, so that remains the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageLabel {
    #[default]
    Jpeg,
    Png,
}

impl ImageLabel {
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Jpeg => ContentType::Jpeg,
            Self::Png => ContentType::Png,
        }
    }
}

/// What a message carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Html(String),
    /// Encoded image bytes in any format the `image` crate can decode.
    Image(Vec<u8>),
}

/// HTTP verbs used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// A single transport-ready HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub content_type: Option<ContentType>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Plain GET with no headers and no body.
    pub fn get(url: Url) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            content_type: None,
            body: Vec::new(),
        }
    }
}

/// A fully formed message POST.  Built once and consumed by dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    url: Url,
    content_type: ContentType,
    body: Vec<u8>,
}

impl OutboundMessage {
    pub fn post(url: Url, content_type: ContentType, body: Vec<u8>) -> Self {
        Self {
            url,
            content_type,
            body,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        HttpMethod::Post
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_request(self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url: self.url,
            content_type: Some(self.content_type),
            body: self.body,
        }
    }
}

/// Broad category of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Other,
}

/// A failure that happened before any HTTP status was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure {
    pub kind: TransportErrorKind,
    /// The transport's own message.
    pub detail: String,
}

impl TransportFailure {
    pub fn new(kind: TransportErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.detail)
    }
}

/// Raw result of one HTTP exchange, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The exchange failed below HTTP.
    Failed(TransportFailure),
    /// An HTTP response arrived.
    Response { status: u16, body: Option<Vec<u8>> },
    /// Something came back but carried no HTTP status.
    Unrecognized,
}
