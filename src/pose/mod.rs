//! Pose detection: camera frames in, posture-angle samples out.
//!
//! The real pose model and camera are external collaborators behind the
//! [`PoseEstimator`] and [`FrameSource`] traits; [`detection_loop`] drives
//! them on the detection tick, and [`DetectionHost`] owns the running loops
//! on behalf of the relay coordinator.

pub mod camera;
pub mod detector;
pub mod estimator;
pub mod host;

pub use camera::{CameraError, Frame, FrameSource, SyntheticCamera};
pub use detector::{detection_loop, DetectionStatus};
pub use estimator::{
    AngleSample, PoseError, PoseEstimator, SyntheticEstimator, UnavailableEstimator,
};
pub use host::DetectionHost;
