//! The detection loop — one capture context's thread of control.
//!
//! Owns the camera handle and the pose-estimation calls.  On a fixed tick it
//! grabs a frame, runs the estimator on the blocking thread pool, feeds the
//! session aggregator, and emits angle updates to the relay.  On the
//! feedback cadence it additionally broadcasts aggregate stats and writes a
//! posture log to the backend.
//!
//! # Backpressure
//!
//! Each estimate is awaited before the next tick is taken, and the interval
//! uses `MissedTickBehavior::Skip` — a tick that fires while estimation is
//! still running is skipped, never queued, so a slow model cannot pile up
//! overlapping work.
//!
//! # Termination
//!
//! * Cancellation token fired — the coordinator tore this context down; the
//!   camera is released and the backend session closed.
//! * Camera or model failure at startup, or a model-load failure mid-run —
//!   terminal; the loop notifies the coordinator via `context_closed` so the
//!   lifecycle flips to inactive exactly as if the user had stopped.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{DetectionConfig, FeedbackConfig};
use crate::pose::camera::FrameSource;
use crate::pose::estimator::{AngleSample, PoseError, PoseEstimator};
use crate::posture::{classify, PostureStatus, SessionAggregator};
use crate::relay::{ContextId, RelayHandle};
use crate::report::SessionReporter;

// ---------------------------------------------------------------------------
// DetectionStatus
// ---------------------------------------------------------------------------

/// Status of the capture surface, shown next to the camera preview.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionStatus {
    /// Camera and model are being brought up.
    Initializing,
    /// Poses are being detected and classified.
    Active,
    /// No usable pose in the current frames.
    PositionYourself,
    /// The session ended with a terminal error.
    Failed(String),
}

impl DetectionStatus {
    /// Status line for display.
    pub fn label(&self) -> String {
        match self {
            DetectionStatus::Initializing => "Starting camera...".into(),
            DetectionStatus::Active => "Camera active - monitoring posture".into(),
            DetectionStatus::PositionYourself => {
                "Position yourself in front of the camera".into()
            }
            DetectionStatus::Failed(e) => format!("Monitoring stopped: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// detection_loop
// ---------------------------------------------------------------------------

/// Run one capture context until cancellation or a terminal failure.
#[allow(clippy::too_many_arguments)]
pub async fn detection_loop(
    context_id: ContextId,
    mut camera: Box<dyn FrameSource>,
    estimator: Arc<dyn PoseEstimator>,
    relay: RelayHandle,
    mut reporter: SessionReporter,
    detection: DetectionConfig,
    feedback: FeedbackConfig,
    status_tx: watch::Sender<DetectionStatus>,
    cancel: CancellationToken,
) {
    let _ = status_tx.send(DetectionStatus::Initializing);

    if let Err(e) = camera.open() {
        error!("detector[{context_id}]: camera unavailable: {e}");
        let _ = status_tx.send(DetectionStatus::Failed(e.to_string()));
        relay.context_closed(context_id).await;
        return;
    }

    let mut aggregator = SessionAggregator::new();
    aggregator.start();
    reporter.begin().await;

    let tick = Duration::from_millis(detection.interval_ms.max(1));
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let feedback_interval = Duration::from_secs(feedback.interval_secs);
    let keep_alive_interval = Duration::from_secs(detection.keep_alive_secs.max(1));
    let mut last_feedback = Instant::now();
    let mut last_keep_alive = Instant::now();

    let mut last_sample: Option<AngleSample> = None;
    let mut last_status = PostureStatus::Good;
    let mut corrected_since_log = false;
    let mut external_close = false;

    info!("detector[{context_id}]: session started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("detector[{context_id}]: cancelled");
                break;
            }
            _ = ticker.tick() => {
                let frame = match camera.grab() {
                    Ok(frame) => frame,
                    Err(e) => {
                        // A single bad frame is transient; keep ticking.
                        warn!("detector[{context_id}]: frame grab failed: {e}");
                        continue;
                    }
                };

                let est = Arc::clone(&estimator);
                let result = tokio::task::spawn_blocking(move || est.estimate(&frame)).await;

                match result {
                    Ok(Ok(Some(sample))) => {
                        let classification = classify(sample.total);
                        let status = PostureStatus::from_angle(sample.total);
                        aggregator.observe(classification.is_good);

                        if last_status == PostureStatus::Bad && status != PostureStatus::Bad {
                            corrected_since_log = true;
                        }
                        last_status = status;
                        last_sample = Some(sample);

                        let _ = status_tx.send(DetectionStatus::Active);

                        let ack = relay.angle_update(sample.total).await;
                        if !ack.success {
                            debug!(
                                "detector[{context_id}]: angle update not delivered: {:?}",
                                ack.error
                            );
                        }
                    }
                    Ok(Ok(None)) => {
                        // No pose — skip classification, prompt the user.
                        let _ = status_tx.send(DetectionStatus::PositionYourself);
                    }
                    Ok(Err(PoseError::ModelLoad(e))) => {
                        error!("detector[{context_id}]: pose backend failed: {e}");
                        let _ = status_tx.send(DetectionStatus::Failed(e));
                        external_close = true;
                        break;
                    }
                    Ok(Err(e)) => {
                        // Transient per-tick failure; the next tick proceeds.
                        warn!("detector[{context_id}]: estimation failed: {e}");
                    }
                    Err(e) => {
                        warn!("detector[{context_id}]: estimation task panicked: {e}");
                    }
                }

                if last_feedback.elapsed() >= feedback_interval {
                    last_feedback = Instant::now();
                    let stats = aggregator.snapshot();
                    relay.periodic_feedback(stats).await;

                    if let Some(sample) = &last_sample {
                        reporter
                            .log(
                                sample,
                                last_status,
                                last_status.message(),
                                corrected_since_log,
                                feedback.interval_secs,
                            )
                            .await;
                        corrected_since_log = false;
                    }
                }

                if last_keep_alive.elapsed() >= keep_alive_interval {
                    last_keep_alive = Instant::now();
                    relay.keep_alive().await;
                }
            }
        }
    }

    camera.close();
    let stats = aggregator.snapshot();
    aggregator.stop();
    reporter.finish(&stats).await;

    if external_close {
        // The coordinator did not initiate this teardown — tell it.
        relay.context_closed(context_id).await;
    }

    info!(
        "detector[{context_id}]: session ended ({} frames, {:.1}% good)",
        stats.total_frames,
        stats.good_percentage()
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use tokio::sync::mpsc;

    use crate::config::BackendConfig;
    use crate::pose::camera::MockCamera;
    use crate::pose::estimator::MockEstimator;
    use crate::relay::{Ack, Envelope, RelayRequest};

    /// Collects every request the loop sends and acknowledges it.
    fn spawn_acker(
        mut rx: mpsc::Receiver<Envelope>,
    ) -> (Arc<Mutex<Vec<RelayRequest>>>, tokio::task::JoinHandle<()>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let handle = tokio::spawn(async move {
            while let Some(env) = rx.recv().await {
                seen_clone.lock().unwrap().push(env.request.clone());
                if let Some(reply) = env.reply {
                    let _ = reply.send(Ack::ok());
                }
            }
        });
        (seen, handle)
    }

    fn fast_configs() -> (DetectionConfig, FeedbackConfig) {
        (
            DetectionConfig {
                interval_ms: 5,
                keep_alive_secs: 3600,
                ..DetectionConfig::default()
            },
            FeedbackConfig {
                interval_secs: 3600,
                nudge_cooldown_secs: 0,
            },
        )
    }

    fn inert_reporter() -> SessionReporter {
        SessionReporter::from_config(&BackendConfig {
            enabled: false,
            ..BackendConfig::default()
        })
    }

    async fn run_loop_until(
        estimator: MockEstimator,
        camera: MockCamera,
        detection: DetectionConfig,
        feedback: FeedbackConfig,
        stop_after: Duration,
    ) -> (Vec<RelayRequest>, DetectionStatus) {
        let (tx, rx) = mpsc::channel(64);
        let (seen, acker) = spawn_acker(rx);
        let (status_tx, status_rx) = watch::channel(DetectionStatus::Initializing);
        let cancel = CancellationToken::new();

        let loop_handle = tokio::spawn(detection_loop(
            1,
            Box::new(camera),
            Arc::new(estimator),
            RelayHandle::new(tx),
            inert_reporter(),
            detection,
            feedback,
            status_tx,
            cancel.clone(),
        ));

        tokio::time::sleep(stop_after).await;
        cancel.cancel();
        loop_handle.await.unwrap();
        acker.abort();

        let requests = seen.lock().unwrap().clone();
        let status = status_rx.borrow().clone();
        (requests, status)
    }

    #[tokio::test]
    async fn angle_updates_reach_the_relay() {
        let (detection, feedback) = fast_configs();
        let (requests, status) = run_loop_until(
            MockEstimator::constant(60.0),
            MockCamera::ok(),
            detection,
            feedback,
            Duration::from_millis(80),
        )
        .await;

        let angles: Vec<f64> = requests
            .iter()
            .filter_map(|r| match r {
                RelayRequest::AngleUpdate { angle } => Some(*angle),
                _ => None,
            })
            .collect();
        assert!(!angles.is_empty(), "expected at least one angle update");
        assert!(angles.iter().all(|&a| a == 60.0));
        assert_eq!(status, DetectionStatus::Active);
    }

    #[tokio::test]
    async fn missing_pose_prompts_instead_of_classifying() {
        let (detection, feedback) = fast_configs();
        let (requests, status) = run_loop_until(
            MockEstimator::scripted(vec![Ok(None)]),
            MockCamera::ok(),
            detection,
            feedback,
            Duration::from_millis(60),
        )
        .await;

        assert!(
            !requests
                .iter()
                .any(|r| matches!(r, RelayRequest::AngleUpdate { .. })),
            "no angle updates without a detected pose"
        );
        assert_eq!(status, DetectionStatus::PositionYourself);
    }

    #[tokio::test]
    async fn transient_estimation_failure_does_not_stop_the_loop() {
        let (detection, feedback) = fast_configs();
        let (requests, _) = run_loop_until(
            MockEstimator::scripted(vec![
                Err(PoseError::Estimation("blurry frame".into())),
                Ok(Some(AngleSample::combined(72.0))),
            ]),
            MockCamera::ok(),
            detection,
            feedback,
            Duration::from_millis(80),
        )
        .await;

        assert!(requests
            .iter()
            .any(|r| matches!(r, RelayRequest::AngleUpdate { angle } if *angle == 72.0)));
    }

    #[tokio::test]
    async fn camera_denial_notifies_context_closed() {
        let (detection, feedback) = fast_configs();
        let (requests, status) = run_loop_until(
            MockEstimator::constant(60.0),
            MockCamera::denied(),
            detection,
            feedback,
            Duration::from_millis(40),
        )
        .await;

        assert!(requests
            .iter()
            .any(|r| matches!(r, RelayRequest::ContextClosed { context_id: 1 })));
        assert!(matches!(status, DetectionStatus::Failed(_)));
    }

    #[tokio::test]
    async fn model_load_failure_is_terminal_and_notifies() {
        let (detection, feedback) = fast_configs();
        let (requests, status) = run_loop_until(
            MockEstimator::scripted(vec![Err(PoseError::ModelLoad("no backend".into()))]),
            MockCamera::ok(),
            detection,
            feedback,
            Duration::from_millis(60),
        )
        .await;

        assert!(requests
            .iter()
            .any(|r| matches!(r, RelayRequest::ContextClosed { context_id: 1 })));
        assert!(matches!(status, DetectionStatus::Failed(_)));
    }

    #[tokio::test]
    async fn periodic_feedback_fires_on_its_cadence() {
        let (detection, mut feedback) = fast_configs();
        feedback.interval_secs = 0; // every tick
        let (requests, _) = run_loop_until(
            MockEstimator::constant(85.0),
            MockCamera::ok(),
            detection,
            feedback,
            Duration::from_millis(80),
        )
        .await;

        let feedbacks: Vec<_> = requests
            .iter()
            .filter_map(|r| match r {
                RelayRequest::PeriodicFeedback { stats } => Some(*stats),
                _ => None,
            })
            .collect();
        assert!(!feedbacks.is_empty());
        // 85° is good posture, so the rolling percentage is 100.
        let last = feedbacks.last().unwrap();
        assert_eq!(last.good_frames, last.total_frames);
    }

    #[test]
    fn status_labels_are_user_facing() {
        assert!(DetectionStatus::PositionYourself.label().contains("Position yourself"));
        assert!(DetectionStatus::Failed("camera permission denied".into())
            .label()
            .contains("camera permission denied"));
    }
}
