//! Lifecycle coordination and fan-out.
//!
//! [`Coordinator`] is the single writer of the monitoring lifecycle state.
//! It creates/destroys the capture context through a [`ContextHost`], keeps
//! the persisted status blob in step with every transition, and fans angle
//! and feedback updates out to an explicit subscriber list with
//! per-subscriber error isolation — one dead surface never blocks delivery
//! to the others and never fails the sender's request.

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::relay::message::{Ack, Envelope, RelayRequest, SurfaceUpdate};
use crate::relay::status::{MonitorStatus, StatusStore};

/// Opaque identifier for one capture context instance.
pub type ContextId = u64;

// ---------------------------------------------------------------------------
// RelayError
// ---------------------------------------------------------------------------

/// Errors surfaced by lifecycle operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The capture context could not be created (camera denied, no pose
    /// backend configured, …).  Terminal for the start request.
    #[error("failed to create capture context: {0}")]
    ContextCreation(String),

    /// The capture context could not be torn down cleanly.  Logged by the
    /// coordinator, never surfaced to the stop caller.
    #[error("failed to destroy capture context: {0}")]
    ContextDestruction(String),
}

// ---------------------------------------------------------------------------
// ContextHost
// ---------------------------------------------------------------------------

/// Owner of real capture contexts.
///
/// The coordinator never touches the camera or the detection loop directly;
/// it asks the host to bring a context up or tear it down and tracks only
/// the returned [`ContextId`].
#[async_trait]
pub trait ContextHost: Send + Sync {
    /// Create a capture context and return once it is ready to produce
    /// angle samples.
    async fn create(&self) -> Result<ContextId, RelayError>;

    /// Tear down the given context, releasing its camera handle.
    async fn destroy(&self, id: ContextId) -> Result<(), RelayError>;
}

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// One delivery failure.  `Disconnected` subscribers are dropped from the
/// list; any other failure is logged and the subscriber is kept.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("subscriber is gone")]
    Disconnected,
    #[error("delivery failed: {0}")]
    Failed(String),
}

/// A presentation surface address the coordinator can deliver updates to.
pub trait Subscriber: Send {
    /// Short name used in delivery-failure log lines.
    fn name(&self) -> &str;

    /// Deliver one update.  Must not block.
    fn deliver(&self, update: &SurfaceUpdate) -> Result<(), DeliveryError>;
}

/// Subscriber backed by a bounded channel to an async surface task.
///
/// Uses `try_send` so fan-out never blocks on a slow surface; a full queue
/// drops that one update for that one surface.
pub struct ChannelSubscriber {
    name: String,
    tx: mpsc::Sender<SurfaceUpdate>,
}

impl ChannelSubscriber {
    pub fn new(name: impl Into<String>, tx: mpsc::Sender<SurfaceUpdate>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }
}

impl Subscriber for ChannelSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn deliver(&self, update: &SurfaceUpdate) -> Result<(), DeliveryError> {
        use mpsc::error::TrySendError;
        match self.tx.try_send(update.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Closed(_)) => Err(DeliveryError::Disconnected),
            Err(TrySendError::Full(_)) => {
                Err(DeliveryError::Failed("update queue is full".into()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Monitoring on/off state plus the owning capture context handle.
///
/// Private to the coordinator — every other component sees it only through
/// request replies or the persisted status blob.
#[derive(Debug, Default)]
struct Lifecycle {
    is_monitoring: bool,
    context_id: Option<ContextId>,
}

/// Single-threaded request processor for the relay protocol.
///
/// Run it with [`Coordinator::run`] on a tokio task and talk to it through
/// a [`crate::relay::RelayHandle`].
pub struct Coordinator {
    host: std::sync::Arc<dyn ContextHost>,
    subscribers: Vec<Box<dyn Subscriber>>,
    status: StatusStore,
    lifecycle: Lifecycle,
}

impl Coordinator {
    pub fn new(host: std::sync::Arc<dyn ContextHost>, status: StatusStore) -> Self {
        Self {
            host,
            subscribers: Vec::new(),
            status,
            lifecycle: Lifecycle::default(),
        }
    }

    /// Register a presentation surface for fan-out.
    pub fn subscribe(&mut self, subscriber: Box<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn is_monitoring(&self) -> bool {
        self.lifecycle.is_monitoring
    }

    /// Process envelopes until the channel closes.
    pub async fn run(mut self, mut rx: mpsc::Receiver<Envelope>) {
        while let Some(envelope) = rx.recv().await {
            let ack = self.handle(envelope.request).await;
            if let Some(reply) = envelope.reply {
                // The requester may have given up waiting; that is fine.
                let _ = reply.send(ack);
            }
        }
        info!("relay: envelope channel closed, coordinator shutting down");
    }

    /// Handle one request.  Exposed for direct use in tests.
    pub async fn handle(&mut self, request: RelayRequest) -> Ack {
        match request {
            RelayRequest::StartMonitoring => self.handle_start().await,
            RelayRequest::StopMonitoring => self.handle_stop().await,
            RelayRequest::AngleUpdate { angle } => {
                self.fan_out(&SurfaceUpdate::Angle { angle });
                Ack::ok()
            }
            RelayRequest::PeriodicFeedback { stats } => {
                self.fan_out(&SurfaceUpdate::Feedback { stats });
                Ack::ok()
            }
            RelayRequest::KeepAlive => Ack::ok(),
            RelayRequest::ContextClosed { context_id } => self.handle_context_closed(context_id),
        }
    }

    async fn handle_start(&mut self) -> Ack {
        if self.lifecycle.is_monitoring {
            debug!("relay: start while already monitoring — no-op");
            return Ack::ok();
        }

        match self.host.create().await {
            Ok(id) => {
                self.lifecycle.is_monitoring = true;
                self.lifecycle.context_id = Some(id);
                self.persist();
                info!("relay: monitoring started (context {id})");
                Ack::ok()
            }
            Err(e) => {
                warn!("relay: start failed: {e}");
                Ack::failure(e.to_string())
            }
        }
    }

    async fn handle_stop(&mut self) -> Ack {
        if let Some(id) = self.lifecycle.context_id.take() {
            // Best-effort teardown — stopping must never fail for the caller.
            if let Err(e) = self.host.destroy(id).await {
                warn!("relay: context {id} teardown failed (ignored): {e}");
            }
        }
        self.lifecycle.is_monitoring = false;
        self.persist();
        info!("relay: monitoring stopped");
        Ack::ok()
    }

    fn handle_context_closed(&mut self, context_id: ContextId) -> Ack {
        if self.lifecycle.context_id != Some(context_id) {
            // A stale notification from an already-replaced context.
            debug!("relay: ignoring close of unknown context {context_id}");
            return Ack::ok();
        }
        self.lifecycle.context_id = None;
        self.lifecycle.is_monitoring = false;
        self.persist();
        info!("relay: capture context {context_id} closed externally — monitoring off");
        Ack::ok()
    }

    /// Deliver `update` to every subscriber, isolating failures per
    /// subscriber.  Disconnected subscribers are pruned.
    fn fan_out(&mut self, update: &SurfaceUpdate) {
        self.subscribers.retain(|sub| match sub.deliver(update) {
            Ok(()) => true,
            Err(DeliveryError::Disconnected) => {
                info!("relay: subscriber '{}' disconnected, removing", sub.name());
                false
            }
            Err(e) => {
                warn!("relay: delivery to '{}' failed: {e}", sub.name());
                true
            }
        });
    }

    fn persist(&self) {
        let status = MonitorStatus {
            is_monitoring: self.lifecycle.is_monitoring,
            context_id: self.lifecycle.context_id,
        };
        if let Err(e) = self.status.write(&status) {
            // Status blob is advisory; losing it only affects UI recovery.
            warn!("relay: failed to persist monitor status: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
