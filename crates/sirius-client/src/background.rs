// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Deferred delivery channel.
//
// Fire-and-forget: `submit` never waits and never reports an error.  Each
// submission is delivered on its own detached task, so deliveries outlive
// both the caller and the `SiriusClient` that queued them (for as long as
// the runtime runs).  Nothing is ever dropped for lack of room.
//
// Outcomes are classified and logged but never surfaced to the submitter.
// When the last pending delivery finishes the channel logs
// "Background events finished." and wakes anyone in `wait_idle`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

use sirius_core::types::{HttpRequest, OutboundMessage, RequestId};

use crate::classify::classify_send;
use crate::transport::HttpTransport;

/// Counts in-flight deliveries and broadcasts transitions to idle.
struct DeliveryTracker {
    identifier: String,
    pending: AtomicUsize,
    changed: watch::Sender<()>,
}

impl DeliveryTracker {
    fn begin(self: &Arc<Self>) -> PendingDelivery {
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.changed.send_replace(());
        PendingDelivery {
            tracker: Arc::clone(self),
            settled: false,
        }
    }

    fn finish(&self) {
        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            info!(identifier = %self.identifier, "Background events finished.");
        }
        self.changed.send_replace(());
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Marks one delivery finished when dropped, even if the delivery panicked.
struct PendingDelivery {
    tracker: Arc<DeliveryTracker>,
    settled: bool,
}

impl Drop for PendingDelivery {
    fn drop(&mut self) {
        if !self.settled {
            error!("background delivery ended without an outcome");
        }
        self.tracker.finish();
    }
}

/// Background sender.  Every submission gets its own delivery task.
pub struct BackgroundChannel {
    runtime: Handle,
    transport: Arc<dyn HttpTransport>,
    tracker: Arc<DeliveryTracker>,
}

impl BackgroundChannel {
    /// Create a channel whose deliveries run on `runtime`.
    pub fn new(runtime: &Handle, transport: Arc<dyn HttpTransport>, identifier: &str) -> Self {
        let (changed, _) = watch::channel(());
        let tracker = Arc::new(DeliveryTracker {
            identifier: identifier.to_owned(),
            pending: AtomicUsize::new(0),
            changed,
        });

        info!(identifier, "background channel ready");
        Self {
            runtime: runtime.clone(),
            transport,
            tracker,
        }
    }

    /// Hand `message` off for delivery.  Returns immediately.
    pub fn submit(&self, message: OutboundMessage) -> RequestId {
        let id = RequestId::new();
        let request = message.into_request();
        let span = info_span!(
            "background_delivery",
            identifier = %self.tracker.identifier,
            %id,
            url = %request.url,
        );
        let guard = self.tracker.begin();
        self.runtime.spawn(
            deliver(Arc::clone(&self.transport), request, guard).instrument(span),
        );
        debug!(%id, "queued for background delivery");
        id
    }

    /// Deliveries queued or in flight.
    pub fn pending(&self) -> usize {
        self.tracker.pending()
    }

    /// Resolve once nothing is queued or in flight.
    pub async fn wait_idle(&self) {
        let mut changes = self.tracker.changed.subscribe();
        // The sender lives in `self.tracker`, so this only returns once idle.
        let _ = changes.wait_for(|_| self.tracker.pending() == 0).await;
    }
}

async fn deliver(
    transport: Arc<dyn HttpTransport>,
    request: HttpRequest,
    mut guard: PendingDelivery,
) {
    let outcome = transport.execute(request).await;
    match classify_send(outcome) {
        Ok(()) => info!("background delivery succeeded"),
        Err(err) => warn!(error = %err, "background delivery failed"),
    }
    guard.settled = true;
}
