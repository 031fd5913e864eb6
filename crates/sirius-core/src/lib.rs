// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sirius: core types, errors and configuration shared by the client crate.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod types;

pub use config::ClientConfig;
pub use error::SiriusError;
pub use types::*;
