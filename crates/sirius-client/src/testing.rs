// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted transport for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use sirius_core::types::{HttpRequest, TransferOutcome};

use crate::transport::HttpTransport;

type Script = Box<dyn Fn(&HttpRequest) -> (Duration, TransferOutcome) + Send + Sync>;

/// Records every request and answers from a script after a delay.
pub struct MockTransport {
    script: Script,
    seen: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(
        script: impl Fn(&HttpRequest) -> (Duration, TransferOutcome) + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(script),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(delay: Duration, outcome: TransferOutcome) -> Self {
        Self::new(move |_| (delay, outcome.clone()))
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> TransferOutcome {
        let (delay, outcome) = (self.script)(&request);
        self.seen.lock().unwrap().push(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        outcome
    }
}

/// A transport whose every exchange panics.
pub struct PanickingTransport;

#[async_trait]
impl HttpTransport for PanickingTransport {
    async fn execute(&self, request: HttpRequest) -> TransferOutcome {
        panic!("transport blew up on {}", request.url);
    }
}
