//! Pose-estimation seam.
//!
//! [`PoseEstimator`] is the object-safe interface the detection loop calls
//! once per tick.  The real model (MoveNet-class pose detection) is an
//! external collaborator; this crate ships:
//!
//! * [`SyntheticEstimator`] — a development backend that produces a slowly
//!   drifting angle so the full pipeline can run without a model file.
//! * [`UnavailableEstimator`] — a stub that always reports the configured
//!   failure, used when no pose backend is set up (the app still starts).
//! * `MockEstimator` (`#[cfg(test)]`) — a scripted double for loop tests.

use std::sync::Mutex;

use thiserror::Error;

use crate::pose::camera::Frame;

// ---------------------------------------------------------------------------
// AngleSample
// ---------------------------------------------------------------------------

/// One measured posture-deviation sample, in degrees.
///
/// `total` drives classification; the left/right shoulder components are
/// kept when the model provides them and forwarded to the backend log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSample {
    pub total: f64,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

impl AngleSample {
    /// A sample with no per-side decomposition.
    pub fn combined(total: f64) -> Self {
        Self {
            total,
            left: None,
            right: None,
        }
    }

    /// A sample built from left/right components; `total` is their mean.
    pub fn from_sides(left: f64, right: f64) -> Self {
        Self {
            total: (left + right) / 2.0,
            left: Some(left),
            right: Some(right),
        }
    }
}

// ---------------------------------------------------------------------------
// PoseError
// ---------------------------------------------------------------------------

/// Errors from the pose-estimation subsystem.
#[derive(Debug, Clone, Error)]
pub enum PoseError {
    /// The model backend could not be initialised.  Terminal for the
    /// session.
    #[error("pose model unavailable: {0}")]
    ModelLoad(String),

    /// One estimation pass failed.  Transient — the next tick proceeds.
    #[error("pose estimation failed: {0}")]
    Estimation(String),
}

// ---------------------------------------------------------------------------
// PoseEstimator trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for pose estimation.
///
/// # Contract
///
/// * `Ok(Some(sample))` — a pose with the required landmarks was found.
/// * `Ok(None)` — no usable pose in this frame (person out of view).  The
///   caller skips classification and shows a "position yourself" prompt.
/// * `Err(_)` — the estimation pass itself failed.
pub trait PoseEstimator: Send + Sync {
    fn estimate(&self, frame: &Frame) -> Result<Option<AngleSample>, PoseError>;
}

// Compile-time assertion: Box<dyn PoseEstimator> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn PoseEstimator>) {}
};

// ---------------------------------------------------------------------------
// SyntheticEstimator
// ---------------------------------------------------------------------------

/// Development backend: a deterministic angle that drifts between slouching
/// and sitting upright, crossing both classifier breakpoints.
pub struct SyntheticEstimator {
    phase: Mutex<f64>,
}

impl SyntheticEstimator {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(0.0),
        }
    }
}

impl Default for SyntheticEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl PoseEstimator for SyntheticEstimator {
    fn estimate(&self, _frame: &Frame) -> Result<Option<AngleSample>, PoseError> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        *phase += 0.05;
        // Sweep 35°..95° so good, degrading and bad are all exercised.
        let total = 65.0 + 30.0 * phase.sin();
        Ok(Some(AngleSample::from_sides(total - 2.0, total + 2.0)))
    }
}

// ---------------------------------------------------------------------------
// UnavailableEstimator
// ---------------------------------------------------------------------------

/// Fallback when no pose backend is configured; every call reports the same
/// load failure so monitoring fails with a descriptive error instead of the
/// process refusing to start.
pub struct UnavailableEstimator {
    reason: String,
}

impl UnavailableEstimator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PoseEstimator for UnavailableEstimator {
    fn estimate(&self, _frame: &Frame) -> Result<Option<AngleSample>, PoseError> {
        Err(PoseError::ModelLoad(self.reason.clone()))
    }
}

// ---------------------------------------------------------------------------
// MockEstimator  (test-only)
// ---------------------------------------------------------------------------

/// Scripted test double: returns its step results in order, then repeats the
/// last one.
#[cfg(test)]
pub struct MockEstimator {
    steps: Mutex<std::collections::VecDeque<Result<Option<AngleSample>, PoseError>>>,
    last: Mutex<Result<Option<AngleSample>, PoseError>>,
}

#[cfg(test)]
impl MockEstimator {
    pub fn scripted(steps: Vec<Result<Option<AngleSample>, PoseError>>) -> Self {
        let last = steps.last().cloned().unwrap_or(Ok(None));
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(last),
        }
    }

    /// A mock that always returns the same combined angle.
    pub fn constant(angle: f64) -> Self {
        Self::scripted(vec![Ok(Some(AngleSample::combined(angle)))])
    }
}

#[cfg(test)]
impl PoseEstimator for MockEstimator {
    fn estimate(&self, _frame: &Frame) -> Result<Option<AngleSample>, PoseError> {
        match self.steps.lock().unwrap().pop_front() {
            Some(step) => {
                *self.last.lock().unwrap() = step.clone();
                step
            }
            None => self.last.lock().unwrap().clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::camera::Frame;

    fn frame() -> Frame {
        Frame::blank(64, 48)
    }

    #[test]
    fn sample_from_sides_averages_components() {
        let s = AngleSample::from_sides(70.0, 90.0);
        assert_eq!(s.total, 80.0);
        assert_eq!(s.left, Some(70.0));
        assert_eq!(s.right, Some(90.0));
    }

    #[test]
    fn synthetic_estimator_stays_inside_its_sweep() {
        let est = SyntheticEstimator::new();
        for _ in 0..500 {
            let sample = est.estimate(&frame()).unwrap().unwrap();
            assert!(sample.total >= 35.0 && sample.total <= 95.0);
        }
    }

    #[test]
    fn synthetic_estimator_crosses_both_breakpoints() {
        let est = SyntheticEstimator::new();
        let mut saw_good = false;
        let mut saw_bad = false;
        for _ in 0..500 {
            let sample = est.estimate(&frame()).unwrap().unwrap();
            saw_good |= sample.total >= crate::posture::GOOD_POSTURE_THRESHOLD;
            saw_bad |= sample.total <= crate::posture::MIN_ANGLE;
        }
        assert!(saw_good && saw_bad);
    }

    #[test]
    fn unavailable_estimator_reports_model_load() {
        let est = UnavailableEstimator::new("no backend configured");
        let err = est.estimate(&frame()).unwrap_err();
        assert!(matches!(err, PoseError::ModelLoad(_)));
        assert!(err.to_string().contains("no backend configured"));
    }

    #[test]
    fn mock_estimator_replays_script_then_repeats_last() {
        let est = MockEstimator::scripted(vec![
            Ok(Some(AngleSample::combined(85.0))),
            Ok(None),
        ]);
        assert_eq!(
            est.estimate(&frame()).unwrap(),
            Some(AngleSample::combined(85.0))
        );
        assert_eq!(est.estimate(&frame()).unwrap(), None);
        assert_eq!(est.estimate(&frame()).unwrap(), None);
    }

    #[test]
    fn box_dyn_estimator_compiles() {
        let est: Box<dyn PoseEstimator> = Box::new(SyntheticEstimator::new());
        let _ = est.estimate(&frame());
    }
}
