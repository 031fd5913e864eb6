// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Designated callback context.
//
// Transfers run on runtime workers, but completion callbacks must all run in
// one place (typically the UI loop).  `CallbackContext` is the cloneable
// posting side; `CallbackQueue` is owned by whoever drives that loop and
// runs callbacks in the order they were posted.

use tokio::sync::mpsc;
use tracing::debug;

type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Posting half.  Cheap to clone.
#[derive(Clone)]
pub struct CallbackContext {
    tx: mpsc::UnboundedSender<Callback>,
}

/// Running half.  Exactly one exists per context.
pub struct CallbackQueue {
    rx: mpsc::UnboundedReceiver<Callback>,
}

/// Create a connected context/queue pair.
pub fn callback_context() -> (CallbackContext, CallbackQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CallbackContext { tx }, CallbackQueue { rx })
}

impl CallbackContext {
    /// Queue `f` to run on the owning loop.
    ///
    /// Returns `false` if the queue has been dropped; `f` is then discarded.
    pub fn post(&self, f: impl FnOnce() + Send + 'static) -> bool {
        let posted = self.tx.send(Box::new(f)).is_ok();
        if !posted {
            debug!("callback queue closed, dropping callback");
        }
        posted
    }
}

impl CallbackQueue {
    /// Wait for the next callback and run it.  Returns `false` once every
    /// `CallbackContext` has been dropped and the queue is empty.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    /// Run callbacks until every `CallbackContext` is gone.
    pub async fn run(&mut self) {
        while self.next().await {}
    }

    /// Run whatever is queued right now without waiting.  Returns how many
    /// callbacks ran.
    pub fn drain(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(callback) = self.rx.try_recv() {
            callback();
            ran += 1;
        }
        ran
    }
}
