// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printer info fetcher. Validates a key and reads the printer's info
// document.  Decoding the document is left to the caller.

use tracing::instrument;

use sirius_core::error::Result;
use sirius_core::types::PrinterKey;

use crate::client::SiriusClient;

/// Read path over a shared [`SiriusClient`].
#[derive(Clone)]
pub struct PrinterInfoFetcher {
    client: SiriusClient,
}

impl PrinterInfoFetcher {
    pub fn new(client: SiriusClient) -> Self {
        Self { client }
    }

    /// Fetch the raw info document for `key`.
    ///
    /// Fails with `InvalidUrl` before any network activity if `key` is not a
    /// URL.
    #[instrument(skip(self))]
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let key = PrinterKey::parse(key)?;
        self.client.fetch_info(&key).await
    }
}
