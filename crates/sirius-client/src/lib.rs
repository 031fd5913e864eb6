// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sirius Client: builds printer messages, dispatches them over an
// interactive or a deferred HTTP channel, and classifies what comes back.
// This crate bridges between the domain types defined in `sirius-core` and
// the actual network transport.

pub mod background;
pub mod classify;
pub mod client;
pub mod context;
pub mod info;
pub mod message;
pub mod transport;

#[cfg(test)]
mod testing;

pub use classify::{BodyRequirement, classify, classify_fetch, classify_send};
pub use client::{CancelHandle, InFlight, SiriusClient};
pub use context::{CallbackContext, CallbackQueue, callback_context};
pub use info::PrinterInfoFetcher;
pub use message::{build, build_with_label};
pub use transport::{HttpTransport, ReqwestTransport};
