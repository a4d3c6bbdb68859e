//! Single-consumer dispatch queue.
//!
//! Any number of [`DispatchHandle`]s submit requests; exactly one
//! [`Dispatcher`] serves them, one at a time, in submission order. The
//! worker owns the [`CodeSource`], so the backend session is never touched
//! concurrently.

use {
    async_trait::async_trait,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
};

use vouchbot_unifi::VoucherService;

use crate::request::Request;

/// Produces the reply text for one voucher request.
#[async_trait]
pub trait CodeSource: Send {
    async fn top_codes(&mut self) -> String;
}

#[async_trait]
impl CodeSource for VoucherService {
    async fn top_codes(&mut self) -> String {
        VoucherService::top_codes(self).await
    }
}

/// Returned by [`DispatchHandle::submit`] once the worker is gone. Carries
/// the rejected request back to the caller.
#[derive(Debug, thiserror::Error)]
#[error("dispatch queue closed")]
pub struct DispatchClosed(pub Request);

/// Cloneable submit side of the queue.
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl DispatchHandle {
    pub fn submit(&self, request: Request) -> Result<(), DispatchClosed> {
        self.tx.send(request).map_err(|e| DispatchClosed(e.0))
    }
}

/// The dispatch worker.
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Request>,
    source: Box<dyn CodeSource>,
}

/// Create a queue served by `source`.
pub fn channel(source: impl CodeSource + 'static) -> (DispatchHandle, Dispatcher) {
    let (tx, rx) = mpsc::unbounded_channel();
    (DispatchHandle { tx }, Dispatcher {
        rx,
        source: Box::new(source),
    })
}

impl Dispatcher {
    /// Serve requests until `cancel` fires or every handle is dropped.
    ///
    /// Requests still queued at cancellation are dropped unanswered. A
    /// request already being served runs to completion first.
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let request = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(abandoned = self.rx.len(), "dispatch worker cancelled");
                    break;
                },
                request = self.rx.recv() => match request {
                    Some(request) => request,
                    None => {
                        info!("dispatch queue closed");
                        break;
                    },
                },
            };
            self.serve(request).await;
        }
    }

    async fn serve(&mut self, request: Request) {
        debug!(
            command = %request.command,
            user_id = ?request.user_id,
            "serving request"
        );
        let text = self.source.top_codes().await;
        request.reply.deliver(text).await;
    }
}
