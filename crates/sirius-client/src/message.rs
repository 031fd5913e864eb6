// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Message builder.
//
// Turns a `MessageContent` into a ready-to-send POST:
//
//   | variant | body                      | Content-Type           |
//   |---------|---------------------------|------------------------|
//   | Text    | UTF-8 bytes               | text/plain             |
//   | Html    | UTF-8 bytes               | text/html              |
//   | Image   | re-encoded as PNG         | image/jpeg (see below) |
//
// Image bodies are always PNG.  The header label comes from `ImageLabel`,
// which defaults to `image/jpeg` because that is what deployed servers have
// always been sent.

use std::io::Cursor;

use image::ImageFormat;
use tracing::{debug, instrument, warn};
use url::Url;

use sirius_core::error::{Result, SiriusError};
use sirius_core::types::{
    ContentType, ImageLabel, MessageContent, OutboundMessage, PrinterKey, SenderIdentity,
};

/// Build a message with the default image label.
pub fn build(
    content: MessageContent,
    key: &PrinterKey,
    sender: &SenderIdentity,
) -> Result<OutboundMessage> {
    build_with_label(content, key, sender, ImageLabel::default())
}

/// Build a message, labelling image bodies with `image_label`.
#[instrument(skip_all, fields(key = %key))]
pub fn build_with_label(
    content: MessageContent,
    key: &PrinterKey,
    sender: &SenderIdentity,
    image_label: ImageLabel,
) -> Result<OutboundMessage> {
    let (body, content_type) = encode(content, image_label)?;
    let url = message_url(key, sender)?;
    debug!(%url, %content_type, len = body.len(), "message built");
    Ok(OutboundMessage::post(url, content_type, body))
}

/// `<key>?from=<escaped sender>`.
pub fn message_url(key: &PrinterKey, sender: &SenderIdentity) -> Result<Url> {
    let composed = format!("{}?from={}", key.as_str(), sender.escaped());
    Url::parse(&composed).map_err(|err| {
        warn!(error = %err, "composed message URL does not parse");
        SiriusError::InvalidUrl
    })
}

fn encode(content: MessageContent, image_label: ImageLabel) -> Result<(Vec<u8>, ContentType)> {
    match content {
        MessageContent::Text(text) => Ok((text.into_bytes(), ContentType::PlainText)),
        MessageContent::Html(html) => Ok((html.into_bytes(), ContentType::Html)),
        MessageContent::Image(bytes) => Ok((to_png(&bytes)?, image_label.content_type())),
    }
}

fn to_png(data: &[u8]) -> Result<Vec<u8>> {
    let img = image::load_from_memory(data).map_err(|err| {
        warn!(error = %err, "image could not be decoded");
        SiriusError::InvalidData
    })?;
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).map_err(|err| {
        warn!(error = %err, "PNG encoding failed");
        SiriusError::InvalidData
    })?;
    Ok(out.into_inner())
}
