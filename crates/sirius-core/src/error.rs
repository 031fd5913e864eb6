// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error type for Sirius operations.
//
// The first six variants form the closed taxonomy the server protocol can
// produce.  Their display strings are fixed and shown to users verbatim.

use thiserror::Error;

use crate::types::TransportFailure;

/// Top-level error type for all Sirius operations.
#[derive(Debug, Error)]
pub enum SiriusError {
    // -- Protocol taxonomy --
    #[error("Something happened that isn't handled. Sorry about that.")]
    UnknownError,

    #[error("Unable to create a valid URL with this key")]
    InvalidUrl,

    #[error("Unable to create data with this message")]
    InvalidData,

    #[error("There was no data in the response")]
    NoDataInResponse,

    #[error("This printer key cannot be found, it may have been removed")]
    PrinterNotFound,

    #[error("Server responded with error code {0}")]
    HttpErrorCode(u16),

    // -- Transport --
    /// The request never produced an HTTP response.  Carries the
    /// transport's own message unchanged.
    #[error("{0}")]
    Transport(TransportFailure),

    /// The in-flight operation was cancelled by its owner.
    #[error("The request was cancelled")]
    Cancelled,

    // -- Configuration persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SiriusError {
    /// HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpErrorCode(code) => Some(*code),
            Self::PrinterNotFound => Some(404),
            _ => None,
        }
    }
}

impl From<TransportFailure> for SiriusError {
    fn from(failure: TransportFailure) -> Self {
        Self::Transport(failure)
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SiriusError>;
