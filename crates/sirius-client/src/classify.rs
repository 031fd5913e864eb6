// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Response classifier. Maps a raw `TransferOutcome` onto the Sirius error
// taxonomy.  Pure and synchronous; shared by the fetch and send paths.

use sirius_core::error::{Result, SiriusError};
use sirius_core::types::TransferOutcome;

/// Whether a 200 response must carry a body to count as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRequirement {
    /// Fetch path: an absent or empty body is `NoDataInResponse`.
    Required,
    /// Send path: the body is passed through untouched.
    Ignored,
}

/// Classify one exchange.
pub fn classify(outcome: TransferOutcome, requirement: BodyRequirement) -> Result<Option<Vec<u8>>> {
    match outcome {
        TransferOutcome::Failed(failure) => Err(SiriusError::Transport(failure)),
        TransferOutcome::Response { status: 200, body } => match requirement {
            BodyRequirement::Ignored => Ok(body),
            BodyRequirement::Required => match body {
                Some(data) if !data.is_empty() => Ok(Some(data)),
                _ => Err(SiriusError::NoDataInResponse),
            },
        },
        TransferOutcome::Response { status: 404, .. } => Err(SiriusError::PrinterNotFound),
        TransferOutcome::Response { status, .. } => Err(SiriusError::HttpErrorCode(status)),
        TransferOutcome::Unrecognized => Err(SiriusError::UnknownError),
    }
}

/// Fetch path: success always carries a non-empty body.
pub fn classify_fetch(outcome: TransferOutcome) -> Result<Vec<u8>> {
    classify(outcome, BodyRequirement::Required)?.ok_or(SiriusError::NoDataInResponse)
}

/// Send path: the payload is discarded.
pub fn classify_send(outcome: TransferOutcome) -> Result<()> {
    classify(outcome, BodyRequirement::Ignored).map(|_| ())
}
