// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the screens that send to printers.
//
// The heading is always the error's fixed description; the suggestion tells
// the user what to try next.  Nothing here retries on the user's behalf.

use crate::error::SiriusError;
use crate::types::TransportErrorKind;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or timeout. Trying again later may work.
    Transient,
    /// User must do something (fix the key, pick another picture).
    ActionRequired,
    /// Cannot be fixed by trying again.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Fixed description of the error (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether sending again unchanged could succeed.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

impl HumanError {
    fn new(err: &SiriusError, suggestion: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: err.to_string(),
            suggestion: suggestion.into(),
            retriable: severity == Severity::Transient,
            severity,
        }
    }
}

/// Convert a `SiriusError` into a `HumanError`.
pub fn humanize_error(err: &SiriusError) -> HumanError {
    match err {
        SiriusError::UnknownError => HumanError::new(
            err,
            "Try again. If this keeps happening, please report it.",
            Severity::Transient,
        ),

        SiriusError::InvalidUrl => HumanError::new(
            err,
            "Check the printer key. It should be the full address you were given, starting with https://.",
            Severity::ActionRequired,
        ),

        SiriusError::InvalidData => HumanError::new(
            err,
            "The picture may be damaged or in an unusual format. Try a different one.",
            Severity::ActionRequired,
        ),

        SiriusError::NoDataInResponse => HumanError::new(
            err,
            "The printer answered but said nothing. Try again in a moment.",
            Severity::Transient,
        ),

        SiriusError::PrinterNotFound => HumanError::new(
            err,
            "Ask the printer's owner for its current key.",
            Severity::Permanent,
        ),

        SiriusError::HttpErrorCode(code) if *code >= 500 => HumanError::new(
            err,
            "The printer server is having trouble. Try again later.",
            Severity::Transient,
        ),

        SiriusError::HttpErrorCode(_) => HumanError::new(
            err,
            "The printer server didn't accept this message.",
            Severity::Permanent,
        ),

        SiriusError::Transport(failure) => match failure.kind {
            TransportErrorKind::Timeout => HumanError::new(
                err,
                "The printer server didn't respond in time. Check your connection and try again.",
                Severity::Transient,
            ),
            TransportErrorKind::Connect => HumanError::new(
                err,
                "We couldn't reach the printer server. Make sure you're online, then try again.",
                Severity::Transient,
            ),
            _ => HumanError::new(
                err,
                "The connection was interrupted. Try again.",
                Severity::Transient,
            ),
        },

        SiriusError::Cancelled => HumanError::new(
            err,
            "Nothing was sent.",
            Severity::Permanent,
        ),

        SiriusError::Io(_) | SiriusError::Serialization(_) => HumanError::new(
            err,
            "The settings file couldn't be read. Defaults will be used until it is fixed.",
            Severity::ActionRequired,
        ),
    }
}
