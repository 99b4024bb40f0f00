//! Camera seam.
//!
//! [`FrameSource`] abstracts the webcam.  The handle is exclusively owned by
//! the detection loop: it is opened when the capture context starts, every
//! frame is grabbed through it, and it is released on stop or cancellation.
//! No other component may touch it.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One captured video frame (RGB, row-major).
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl Frame {
    /// An all-black frame, used by the synthetic source and in tests.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgb: vec![0; (width * height * 3) as usize],
        }
    }
}

// ---------------------------------------------------------------------------
// CameraError
// ---------------------------------------------------------------------------

/// Errors from the capture subsystem.
#[derive(Debug, Clone, Error)]
pub enum CameraError {
    /// The user denied camera access.  Terminal for the session; no retry.
    #[error("camera permission denied")]
    PermissionDenied,

    /// No usable capture device.
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    /// A single frame grab failed.
    #[error("frame capture failed: {0}")]
    Capture(String),
}

// ---------------------------------------------------------------------------
// FrameSource trait
// ---------------------------------------------------------------------------

/// Exclusive handle to a video source.
pub trait FrameSource: Send {
    /// Acquire the device.  Must be called before [`grab`](Self::grab).
    fn open(&mut self) -> Result<(), CameraError>;

    /// Capture one frame.
    fn grab(&mut self) -> Result<Frame, CameraError>;

    /// Release the device.  Safe to call more than once.
    fn close(&mut self);
}

// ---------------------------------------------------------------------------
// SyntheticCamera
// ---------------------------------------------------------------------------

/// Development source producing blank frames; pairs with
/// [`crate::pose::SyntheticEstimator`].
pub struct SyntheticCamera {
    open: bool,
    frames_grabbed: u64,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            open: false,
            frames_grabbed: 0,
        }
    }

    pub fn frames_grabbed(&self) -> u64 {
        self.frames_grabbed
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for SyntheticCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        self.open = true;
        Ok(())
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::Capture("camera is not open".into()));
        }
        self.frames_grabbed += 1;
        Ok(Frame::blank(640, 480))
    }

    fn close(&mut self) {
        self.open = false;
    }
}

// ---------------------------------------------------------------------------
// MockCamera  (test-only)
// ---------------------------------------------------------------------------

/// Test double with a configurable open result.
#[cfg(test)]
pub struct MockCamera {
    open_result: Result<(), CameraError>,
    pub opened: bool,
    pub closed: bool,
}

#[cfg(test)]
impl MockCamera {
    pub fn ok() -> Self {
        Self {
            open_result: Ok(()),
            opened: false,
            closed: false,
        }
    }

    pub fn denied() -> Self {
        Self {
            open_result: Err(CameraError::PermissionDenied),
            opened: false,
            closed: false,
        }
    }
}

#[cfg(test)]
impl FrameSource for MockCamera {
    fn open(&mut self) -> Result<(), CameraError> {
        self.opened = true;
        self.open_result.clone()
    }

    fn grab(&mut self) -> Result<Frame, CameraError> {
        Ok(Frame::blank(8, 8))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
