//! Relay message shapes and the caller-side handle.
//!
//! Every request to the coordinator has exactly one reply: [`Ack::ok`] or
//! [`Ack::failure`] with a descriptive error.  [`RelayHandle`] is the
//! clonable sender side used by the control surface and the detection loop;
//! it wraps the envelope channel and turns a dead coordinator into a failed
//! `Ack` instead of a panic.

use tokio::sync::{mpsc, oneshot};

use crate::posture::SessionStats;
use crate::relay::coordinator::ContextId;

// ---------------------------------------------------------------------------
// RelayRequest / Ack
// ---------------------------------------------------------------------------

/// Requests understood by the coordinator.
#[derive(Debug, Clone)]
pub enum RelayRequest {
    /// Start a monitoring session.  Idempotent while one is active.
    StartMonitoring,
    /// Stop the session.  Never fails from the caller's perspective.
    StopMonitoring,
    /// One angle sample from the detection surface, fanned out to every
    /// presentation surface.
    AngleUpdate { angle: f64 },
    /// Aggregate stats on the feedback cadence, fanned out so subscribers
    /// can announce feedback rather than just redraw.
    PeriodicFeedback { stats: SessionStats },
    /// Liveness ping from the detection surface.  Acknowledged, no effect.
    KeepAlive,
    /// The capture context went away without a stop request (user closed the
    /// monitoring surface out-of-band).
    ContextClosed { context_id: ContextId },
}

/// Reply shape shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
    pub error: Option<String>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

/// A request paired with its reply slot.  `reply` is `None` for
/// fire-and-forget senders that do not care about the `Ack`.
#[derive(Debug)]
pub struct Envelope {
    pub request: RelayRequest,
    pub reply: Option<oneshot::Sender<Ack>>,
}

// ---------------------------------------------------------------------------
// SurfaceUpdate
// ---------------------------------------------------------------------------

/// What the coordinator delivers to each subscribed presentation surface.
///
/// The two variants are deliberately distinct message types so a subscriber
/// can tell "redraw visuals" from "announce aggregate feedback".
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceUpdate {
    Angle { angle: f64 },
    Feedback { stats: SessionStats },
}

// ---------------------------------------------------------------------------
// RelayHandle
// ---------------------------------------------------------------------------

/// Clonable sender side of the coordinator's envelope channel.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    tx: mpsc::Sender<Envelope>,
}

impl RelayHandle {
    pub fn new(tx: mpsc::Sender<Envelope>) -> Self {
        Self { tx }
    }

    /// Send `request` and await its `Ack`.
    ///
    /// A closed coordinator channel is reported as a failed `Ack`, never a
    /// panic — callers treat it like any other relay failure.
    pub async fn request(&self, request: RelayRequest) -> Ack {
        let (reply_tx, reply_rx) = oneshot::channel();
        let envelope = Envelope {
            request,
            reply: Some(reply_tx),
        };
        if self.tx.send(envelope).await.is_err() {
            return Ack::failure("coordinator is not running");
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Ack::failure("coordinator dropped the request"))
    }

    pub async fn start_monitoring(&self) -> Ack {
        self.request(RelayRequest::StartMonitoring).await
    }

    pub async fn stop_monitoring(&self) -> Ack {
        self.request(RelayRequest::StopMonitoring).await
    }

    pub async fn angle_update(&self, angle: f64) -> Ack {
        self.request(RelayRequest::AngleUpdate { angle }).await
    }

    pub async fn periodic_feedback(&self, stats: SessionStats) -> Ack {
        self.request(RelayRequest::PeriodicFeedback { stats }).await
    }

    pub async fn keep_alive(&self) -> Ack {
        self.request(RelayRequest::KeepAlive).await
    }

    pub async fn context_closed(&self, context_id: ContextId) -> Ack {
        self.request(RelayRequest::ContextClosed { context_id }).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_constructors() {
        let ok = Ack::ok();
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = Ack::failure("camera denied");
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("camera denied"));
    }

    #[tokio::test]
    async fn handle_reports_dead_coordinator_as_failed_ack() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let handle = RelayHandle::new(tx);
        let ack = handle.keep_alive().await;
        assert!(!ack.success);
    }

    #[tokio::test]
    async fn handle_round_trips_through_the_envelope_channel() {
        let (tx, mut rx) = mpsc::channel(4);
        let handle = RelayHandle::new(tx);

        let server = tokio::spawn(async move {
            let env = rx.recv().await.expect("envelope");
            assert!(matches!(env.request, RelayRequest::AngleUpdate { angle } if angle == 61.0));
            env.reply.unwrap().send(Ack::ok()).unwrap();
        });

        let ack = handle.angle_update(61.0).await;
        assert!(ack.success);
        server.await.unwrap();
    }
}
