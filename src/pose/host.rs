//! Owner of running capture contexts.
//!
//! [`DetectionHost`] implements the coordinator's [`ContextHost`] seam: on
//! `create` it builds the configured camera and pose backend, spawns a
//! [`detection_loop`](crate::pose::detector::detection_loop) task, and hands
//! back an opaque id; on `destroy` it fires that context's cancellation
//! token.  Each context gets its own token so a stale destroy can never
//! tear down a newer session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use log::{debug, info};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, DetectionBackend};
use crate::pose::camera::{FrameSource, SyntheticCamera};
use crate::pose::detector::{detection_loop, DetectionStatus};
use crate::pose::estimator::{PoseEstimator, SyntheticEstimator, UnavailableEstimator};
use crate::relay::{ContextHost, ContextId, RelayError, RelayHandle};
use crate::report::SessionReporter;

pub struct DetectionHost {
    config: AppConfig,
    relay: RelayHandle,
    status_tx: watch::Sender<DetectionStatus>,
    status_rx: watch::Receiver<DetectionStatus>,
    sessions: Mutex<HashMap<ContextId, CancellationToken>>,
    next_id: AtomicU64,
}

impl DetectionHost {
    pub fn new(config: AppConfig, relay: RelayHandle) -> Self {
        let (status_tx, status_rx) = watch::channel(DetectionStatus::Initializing);
        Self {
            config,
            relay,
            status_tx,
            status_rx,
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Watch the status line of whichever context is currently running.
    pub fn watch_status(&self) -> watch::Receiver<DetectionStatus> {
        self.status_rx.clone()
    }

    /// Camera and estimator for a new context.
    ///
    /// `External` without a wired-in model still yields a context; its
    /// estimator reports a load failure on first use, so the session ends
    /// through the external-close path with a descriptive status instead of
    /// the process refusing to start.
    fn build_backend(&self) -> (Box<dyn FrameSource>, Arc<dyn PoseEstimator>) {
        match self.config.detection.backend {
            DetectionBackend::Synthetic => (
                Box::new(SyntheticCamera::new()),
                Arc::new(SyntheticEstimator::new()),
            ),
            DetectionBackend::External => (
                Box::new(SyntheticCamera::new()),
                Arc::new(UnavailableEstimator::new(
                    "no external pose backend is wired in",
                )),
            ),
        }
    }

    fn sessions_lock(&self) -> std::sync::MutexGuard<'_, HashMap<ContextId, CancellationToken>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ContextHost for DetectionHost {
    async fn create(&self) -> Result<ContextId, RelayError> {
        let (mut camera, estimator) = self.build_backend();

        // Open the camera here so a permission problem fails the start
        // request instead of surfacing later as an external close.
        camera
            .open()
            .map_err(|e| RelayError::ContextCreation(e.to_string()))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let cancel = CancellationToken::new();
        self.sessions_lock().insert(id, cancel.clone());

        tokio::spawn(detection_loop(
            id,
            camera,
            estimator,
            self.relay.clone(),
            SessionReporter::from_config(&self.config.backend),
            self.config.detection.clone(),
            self.config.feedback.clone(),
            self.status_tx.clone(),
            cancel,
        ));

        info!("host: capture context {id} created");
        Ok(id)
    }

    async fn destroy(&self, id: ContextId) -> Result<(), RelayError> {
        match self.sessions_lock().remove(&id) {
            Some(cancel) => {
                cancel.cancel();
                debug!("host: capture context {id} cancelled");
                Ok(())
            }
            None => Err(RelayError::ContextDestruction(format!(
                "no running context with id {id}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
