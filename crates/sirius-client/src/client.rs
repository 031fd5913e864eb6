// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sirius transport client.
//
// Owns two channels:
//   - interactive: each call gets its own task and a cancellable `InFlight`
//     handle that resolves to the classified result.
//   - deferred: fire-and-forget delivery through `BackgroundChannel`.
//
// Both channels are built lazily on first use and shared by every clone of
// the client.  Nothing is retried, cached or de-duplicated; overlapping
// calls complete in whatever order the network decides.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use sirius_core::ClientConfig;
use sirius_core::error::{Result, SiriusError};
use sirius_core::types::{
    HttpRequest, MessageContent, OutboundMessage, PrinterKey, RequestId, SenderIdentity,
    TransferOutcome,
};

use crate::background::BackgroundChannel;
use crate::classify::{classify_fetch, classify_send};
use crate::context::CallbackContext;
use crate::message;
use crate::transport::{HttpTransport, ReqwestTransport};

// ---------------------------------------------------------------------------
// In-flight handles
// ---------------------------------------------------------------------------

/// Cancels an in-flight request.  Cloneable and detached from the result.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    id: RequestId,
    abort: Option<AbortHandle>,
}

impl CancelHandle {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Abort the transfer.  Its result becomes `SiriusError::Cancelled`
    /// unless it had already completed.
    pub fn cancel(&self) {
        if let Some(abort) = &self.abort {
            debug!(id = %self.id, "cancelling request");
            abort.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.abort.as_ref().is_none_or(AbortHandle::is_finished)
    }
}

/// A dispatched request.  Await it for the classified result.
///
/// Dropping an `InFlight` does not cancel the transfer; call
/// [`InFlight::cancel`] for that.
pub struct InFlight<T> {
    id: RequestId,
    runtime: Handle,
    state: InFlightState<T>,
}

enum InFlightState<T> {
    /// Settled before any transfer was started.
    Settled(Ready<Result<T>>),
    Running(JoinHandle<Result<T>>),
}

impl<T> InFlight<T> {
    /// A request that failed before anything was sent.
    fn failed(runtime: Handle, err: SiriusError) -> Self {
        Self {
            id: RequestId::new(),
            runtime,
            state: InFlightState::Settled(ready(Err(err))),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn cancel(&self) {
        self.cancel_handle().cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        let abort = match &self.state {
            InFlightState::Settled(_) => None,
            InFlightState::Running(task) => Some(task.abort_handle()),
        };
        CancelHandle { id: self.id, abort }
    }
}

impl<T: Send + 'static> InFlight<T> {
    /// Deliver the result to `callback` on `context` instead of awaiting it.
    ///
    /// The callback always fires exactly once, with `Cancelled` if the
    /// request is cancelled through the returned handle.
    pub fn on_complete(
        self,
        context: &CallbackContext,
        callback: impl FnOnce(Result<T>) + Send + 'static,
    ) -> CancelHandle {
        let handle = self.cancel_handle();
        let context = context.clone();
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            let result = self.await;
            context.post(move || callback(result));
        });
        handle
    }
}

impl<T> Future for InFlight<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let id = self.id;
        match &mut self.state {
            InFlightState::Settled(result) => Pin::new(result).poll(cx),
            InFlightState::Running(task) => Pin::new(task)
                .poll(cx)
                .map(|joined| joined.unwrap_or_else(|err| task_failure(id, err))),
        }
    }
}

/// An aborted task was cancelled; anything else means the task crashed.
fn task_failure<T>(id: RequestId, err: JoinError) -> Result<T> {
    if err.is_cancelled() {
        Err(SiriusError::Cancelled)
    } else {
        error!(%id, error = %err, "request task panicked");
        Err(SiriusError::UnknownError)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A transport built on first use.
struct LazyTransport {
    user_agent: String,
    cell: OnceLock<Arc<dyn HttpTransport>>,
}

impl LazyTransport {
    fn new(user_agent: String) -> Self {
        Self {
            user_agent,
            cell: OnceLock::new(),
        }
    }

    fn preset(transport: Arc<dyn HttpTransport>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(transport);
        Self {
            user_agent: String::new(),
            cell,
        }
    }

    fn get(&self) -> Result<Arc<dyn HttpTransport>> {
        if let Some(transport) = self.cell.get() {
            return Ok(Arc::clone(transport));
        }
        let built: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new(&self.user_agent)?);
        Ok(Arc::clone(self.cell.get_or_init(|| built)))
    }
}

struct ClientInner {
    config: ClientConfig,
    runtime: Handle,
    interactive: LazyTransport,
    deferred: LazyTransport,
    background: OnceLock<BackgroundChannel>,
}

/// Client for the Sirius printer service.  Cheap to clone; clones share
/// both channels.
#[derive(Clone)]
pub struct SiriusClient {
    inner: Arc<ClientInner>,
}

impl SiriusClient {
    /// Create a client whose transfers run on `runtime`.
    pub fn new(config: ClientConfig, runtime: Handle) -> Self {
        let interactive = LazyTransport::new(config.user_agent.clone());
        let deferred = LazyTransport::new(format!(
            "{} ({})",
            config.user_agent, config.background_identifier
        ));
        Self::from_parts(config, runtime, interactive, deferred)
    }

    /// Create a client over caller-supplied transports.
    pub fn with_transports(
        config: ClientConfig,
        runtime: Handle,
        interactive: Arc<dyn HttpTransport>,
        deferred: Arc<dyn HttpTransport>,
    ) -> Self {
        Self::from_parts(
            config,
            runtime,
            LazyTransport::preset(interactive),
            LazyTransport::preset(deferred),
        )
    }

    fn from_parts(
        config: ClientConfig,
        runtime: Handle,
        interactive: LazyTransport,
        deferred: LazyTransport,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                runtime,
                interactive,
                deferred,
                background: OnceLock::new(),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // -- Interactive channel -------------------------------------------------

    /// GET the printer's info document.  Resolves to the raw body.
    #[instrument(skip(self))]
    pub fn fetch_printer_info(&self, key: &str) -> InFlight<Vec<u8>> {
        match PrinterKey::parse(key) {
            Ok(key) => self.fetch_info(&key),
            Err(err) => {
                warn!("printer key is not a URL");
                InFlight::failed(self.inner.runtime.clone(), err)
            }
        }
    }

    /// GET the info document for an already validated key.
    pub fn fetch_info(&self, key: &PrinterKey) -> InFlight<Vec<u8>> {
        self.dispatch(HttpRequest::get(key.url().clone()), |outcome| {
            let result = classify_fetch(outcome);
            if let Ok(body) = &result {
                debug!(body = %String::from_utf8_lossy(body), "printer info received");
            }
            result
        })
    }

    /// POST `message` on the interactive channel.
    pub fn send_message(&self, message: OutboundMessage) -> InFlight<()> {
        self.dispatch(message.into_request(), classify_send)
    }

    /// Build and send in one step, using the configured image label.
    pub fn send_content(
        &self,
        content: MessageContent,
        key: &PrinterKey,
        sender: &SenderIdentity,
    ) -> InFlight<()> {
        match message::build_with_label(content, key, sender, self.inner.config.image_label) {
            Ok(message) => self.send_message(message),
            Err(err) => InFlight::failed(self.inner.runtime.clone(), err),
        }
    }

    /// Callback flavour of [`send_message`](Self::send_message).
    pub fn send_message_with(
        &self,
        message: OutboundMessage,
        context: &CallbackContext,
        callback: impl FnOnce(Result<()>) + Send + 'static,
    ) -> CancelHandle {
        self.send_message(message).on_complete(context, callback)
    }

    /// Callback flavour of [`fetch_printer_info`](Self::fetch_printer_info).
    pub fn fetch_printer_info_with(
        &self,
        key: &str,
        context: &CallbackContext,
        callback: impl FnOnce(Result<Vec<u8>>) + Send + 'static,
    ) -> CancelHandle {
        self.fetch_printer_info(key).on_complete(context, callback)
    }

    fn dispatch<T, F>(&self, request: HttpRequest, classify: F) -> InFlight<T>
    where
        T: Send + 'static,
        F: FnOnce(TransferOutcome) -> Result<T> + Send + 'static,
    {
        let runtime = self.inner.runtime.clone();
        let transport = match self.inner.interactive.get() {
            Ok(transport) => transport,
            Err(err) => {
                error!(error = %err, "interactive channel unavailable");
                return InFlight::failed(runtime, err);
            }
        };

        let id = RequestId::new();
        let span = info_span!(
            "sirius_request",
            %id,
            method = request.method.as_str(),
            url = %request.url,
        );
        let task = runtime.spawn(
            async move {
                debug!("dispatching");
                let outcome = transport.execute(request).await;
                let result = classify(outcome);
                match &result {
                    Ok(_) => info!("request completed"),
                    Err(err) => warn!(error = %err, "request failed"),
                }
                result
            }
            .instrument(span),
        );

        InFlight {
            id,
            runtime,
            state: InFlightState::Running(task),
        }
    }

    // -- Deferred channel ----------------------------------------------------

    /// Queue `message` for background delivery and return immediately.
    ///
    /// The outcome is logged, never reported.
    pub fn send_message_in_background(&self, message: OutboundMessage) {
        match self.background() {
            Some(channel) => {
                channel.submit(message);
            }
            None => warn!(url = %message.url(), "background channel unavailable, message dropped"),
        }
    }

    /// Background deliveries queued or in flight.
    pub fn pending_background(&self) -> usize {
        self.inner.background.get().map_or(0, BackgroundChannel::pending)
    }

    /// Resolve once every background delivery has finished.
    pub async fn background_idle(&self) {
        if let Some(channel) = self.inner.background.get() {
            channel.wait_idle().await;
        }
    }

    fn background(&self) -> Option<&BackgroundChannel> {
        if let Some(channel) = self.inner.background.get() {
            return Some(channel);
        }
        let transport = match self.inner.deferred.get() {
            Ok(transport) => transport,
            Err(err) => {
                error!(error = %err, "failed to build background transport");
                return None;
            }
        };
        let config = &self.inner.config;
        Some(self.inner.background.get_or_init(|| {
            BackgroundChannel::new(&self.inner.runtime, transport, &config.background_identifier)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use image::{DynamicImage, ImageFormat, RgbImage};
    use sirius_core::types::{ContentType, HttpMethod, ImageLabel, SenderIdentity};

    use crate::context::callback_context;
    use crate::testing::{MockTransport, PanickingTransport};

    fn ok(body: Option<&[u8]>) -> TransferOutcome {
        TransferOutcome::Response {
            status: 200,
            body: body.map(<[u8]>::to_vec),
        }
    }

    fn client_over(interactive: Arc<MockTransport>, deferred: Arc<MockTransport>) -> SiriusClient {
        SiriusClient::with_transports(
            ClientConfig::default(),
            Handle::current(),
            interactive,
            deferred,
        )
    }

    fn text_to(key: &str) -> OutboundMessage {
        message::build(
            MessageContent::Text("hello".into()),
            &PrinterKey::parse(key).unwrap(),
            &SenderIdentity::new("Bob"),
        )
        .unwrap()
    }

    fn idle() -> Arc<MockTransport> {
        Arc::new(MockTransport::fixed(Duration::ZERO, ok(None)))
    }

    #[tokio::test]
    async fn send_message_succeeds_on_200() {
        let mock = idle();
        let client = client_over(mock.clone(), idle());

        client.send_message(text_to("https://example.com/in")).await.unwrap();

        let seen = mock.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].content_type, Some(ContentType::PlainText));
        assert_eq!(seen[0].body, b"hello");
    }

    #[tokio::test]
    async fn send_message_reports_missing_printer() {
        let mock = Arc::new(MockTransport::fixed(
            Duration::ZERO,
            TransferOutcome::Response { status: 404, body: None },
        ));
        let client = client_over(mock, idle());

        let result = client.send_message(text_to("https://example.com/in")).await;
        assert!(matches!(result, Err(SiriusError::PrinterNotFound)));
    }

    #[tokio::test]
    async fn fetch_returns_body_from_plain_get() {
        let mock = Arc::new(MockTransport::fixed(Duration::ZERO, ok(Some(b"{\"owner\":\"Ann\"}"))));
        let client = client_over(mock.clone(), idle());

        let body = client.fetch_printer_info("https://example.com/printer/1").await.unwrap();
        assert_eq!(body, b"{\"owner\":\"Ann\"}");

        let seen = mock.requests();
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert_eq!(seen[0].url.as_str(), "https://example.com/printer/1");
        assert_eq!(seen[0].content_type, None);
        assert!(seen[0].body.is_empty());
    }

    #[tokio::test]
    async fn fetch_with_empty_body_is_no_data() {
        let mock = Arc::new(MockTransport::fixed(Duration::ZERO, ok(Some(b""))));
        let client = client_over(mock, idle());

        let result = client.fetch_printer_info("https://example.com/printer/1").await;
        assert!(matches!(result, Err(SiriusError::NoDataInResponse)));
    }

    #[tokio::test]
    async fn fetch_rejects_non_url_key_without_network() {
        let mock = idle();
        let client = client_over(mock.clone(), idle());

        let result = client.fetch_printer_info("not a url").await;
        assert!(matches!(result, Err(SiriusError::InvalidUrl)));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn cancelling_one_send_leaves_the_other_alone() {
        let mock = Arc::new(MockTransport::new(|req| {
            let delay = if req.url.path() == "/slow" {
                Duration::from_secs(5)
            } else {
                Duration::from_millis(50)
            };
            (delay, ok(None))
        }));
        let client = client_over(mock.clone(), idle());

        let slow = client.send_message(text_to("https://example.com/slow"));
        let fast = client.send_message(text_to("https://example.com/fast"));
        assert_ne!(slow.id(), fast.id());

        // Let both transfers start before cancelling.
        tokio::time::sleep(Duration::from_millis(10)).await;
        slow.cancel();

        assert!(matches!(slow.await, Err(SiriusError::Cancelled)));
        assert!(fast.await.is_ok());
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn crashed_transfer_is_unknown_not_cancelled() {
        let client = SiriusClient::with_transports(
            ClientConfig::default(),
            Handle::current(),
            Arc::new(PanickingTransport),
            idle(),
        );

        let result = client.send_message(text_to("https://example.com/in")).await;
        assert!(matches!(result, Err(SiriusError::UnknownError)));
    }

    #[tokio::test]
    async fn crashed_background_transfer_does_not_stall_idle() {
        let client = SiriusClient::with_transports(
            ClientConfig::default(),
            Handle::current(),
            idle(),
            Arc::new(PanickingTransport),
        );

        client.send_message_in_background(text_to("https://example.com/in"));
        tokio::time::timeout(Duration::from_secs(5), client.background_idle())
            .await
            .unwrap();
        assert_eq!(client.pending_background(), 0);
    }

    #[tokio::test]
    async fn background_burst_is_never_dropped() {
        let deferred = Arc::new(MockTransport::fixed(Duration::from_millis(5), ok(None)));
        let client = client_over(idle(), deferred.clone());

        for _ in 0..100 {
            client.send_message_in_background(text_to("https://example.com/in"));
        }
        client.background_idle().await;
        assert_eq!(deferred.requests().len(), 100);
    }

    #[tokio::test]
    async fn callbacks_wait_for_the_designated_context() {
        let client = client_over(idle(), idle());
        let (ctx, mut queue) = callback_context();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let handle = client.send_message_with(text_to("https://example.com/in"), &ctx, move |r| {
            assert!(r.is_ok());
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.is_finished());
        assert!(!fired.load(Ordering::SeqCst));

        assert!(queue.next().await);
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_callback_receives_cancelled() {
        let slow = Arc::new(MockTransport::fixed(Duration::from_secs(5), ok(None)));
        let client = client_over(slow, idle());
        let (ctx, mut queue) = callback_context();
        let outcome = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&outcome);
        let handle = client.send_message_with(text_to("https://example.com/in"), &ctx, move |r| {
            *slot.lock().unwrap() = Some(matches!(r, Err(SiriusError::Cancelled)));
        });
        handle.cancel();

        assert!(queue.next().await);
        assert_eq!(*outcome.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn fetch_callback_reports_invalid_key() {
        let client = client_over(idle(), idle());
        let (ctx, mut queue) = callback_context();
        let outcome = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&outcome);
        client.fetch_printer_info_with("::", &ctx, move |r| {
            *slot.lock().unwrap() = Some(matches!(r, Err(SiriusError::InvalidUrl)));
        });

        assert!(queue.next().await);
        assert_eq!(*outcome.lock().unwrap(), Some(true));
    }

    #[tokio::test]
    async fn background_send_returns_immediately_and_hides_failures() {
        let interactive = idle();
        let deferred = Arc::new(MockTransport::fixed(
            Duration::from_millis(100),
            TransferOutcome::Response { status: 500, body: None },
        ));
        let client = client_over(interactive.clone(), deferred.clone());

        client.send_message_in_background(text_to("https://example.com/in"));
        assert_eq!(client.pending_background(), 1);

        client.background_idle().await;
        assert_eq!(client.pending_background(), 0);
        assert_eq!(deferred.requests().len(), 1);
        assert!(interactive.requests().is_empty());
    }

    #[tokio::test]
    async fn send_content_uses_configured_image_label() {
        let mock = idle();
        let config = ClientConfig {
            image_label: ImageLabel::Png,
            ..Default::default()
        };
        let client = SiriusClient::with_transports(config, Handle::current(), mock.clone(), idle());

        let img = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();

        client
            .send_content(
                MessageContent::Image(bytes.into_inner()),
                &PrinterKey::parse("https://example.com/in").unwrap(),
                &SenderIdentity::new("Bob"),
            )
            .await
            .unwrap();
        assert_eq!(mock.requests()[0].content_type, Some(ContentType::Png));
    }

    #[tokio::test]
    async fn send_content_with_bad_image_sends_nothing() {
        let mock = idle();
        let client = client_over(mock.clone(), idle());

        let result = client
            .send_content(
                MessageContent::Image(vec![0, 1, 2, 3]),
                &PrinterKey::parse("https://example.com/in").unwrap(),
                &SenderIdentity::new("Bob"),
            )
            .await;
        assert!(matches!(result, Err(SiriusError::InvalidData)));
        assert!(mock.requests().is_empty());
    }
}
