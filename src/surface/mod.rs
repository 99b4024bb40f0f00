//! Presentation surface: turns relayed updates into overlay state and
//! occasional nudge lines.
//!
//! A surface is deliberately dumb — it never touches the camera, the
//! aggregator or the lifecycle.  It receives [`SurfaceUpdate`]s from the
//! coordinator's fan-out, keeps the current [`OverlayState`] for whatever
//! renderer sits on top, and rate-limits spoken/printed nudges with a
//! cooldown so a long slouch does not nag on every frame.

use std::time::{Duration, Instant};

use log::info;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;

use crate::config::FeedbackConfig;
use crate::posture::{classify, select_message, IndicatorColor, PostureStatus};
use crate::relay::SurfaceUpdate;

// ---------------------------------------------------------------------------
// OverlayState
// ---------------------------------------------------------------------------

/// Everything a renderer needs to draw the posture overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    /// Backdrop blur radius in pixels.
    pub blur_px: f64,
    /// Dark-overlay opacity in `[0, 1]`.
    pub background_opacity: f64,
    /// Traffic-light indicator; `None` while no pose is detected.
    pub indicator: Option<IndicatorColor>,
    /// Status line shown next to the indicator.
    pub status_text: String,
}

impl OverlayState {
    /// Overlay for a classified angle sample.
    pub fn for_angle(angle: f64) -> Self {
        let c = classify(angle);
        let status = PostureStatus::from_angle(angle);
        Self {
            blur_px: c.blur_px,
            background_opacity: c.overlay_opacity,
            indicator: Some(status.indicator()),
            status_text: status.message().to_string(),
        }
    }

    /// Overlay while the required landmarks are missing.  No blur — the
    /// user cannot fix posture they cannot see assessed.
    pub fn pose_lost() -> Self {
        Self {
            blur_px: 0.0,
            background_opacity: 0.0,
            indicator: None,
            status_text: "Position yourself in front of the camera".to_string(),
        }
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::pose_lost()
    }
}

// ---------------------------------------------------------------------------
// PresentationSurface
// ---------------------------------------------------------------------------

/// One subscriber-side surface: overlay state plus nudge bookkeeping.
pub struct PresentationSurface {
    name: String,
    overlay: OverlayState,
    rng: Box<dyn RngCore + Send>,
    nudge_cooldown: Duration,
    last_nudge: Option<Instant>,
    last_status: Option<PostureStatus>,
}

impl PresentationSurface {
    pub fn new(name: impl Into<String>, feedback: &FeedbackConfig) -> Self {
        Self::with_rng(
            name,
            feedback,
            Box::new(rand::rngs::StdRng::from_entropy()),
        )
    }

    /// Construct with an explicit random source (seeded in tests).
    pub fn with_rng(
        name: impl Into<String>,
        feedback: &FeedbackConfig,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        Self {
            name: name.into(),
            overlay: OverlayState::default(),
            rng,
            nudge_cooldown: Duration::from_secs(feedback.nudge_cooldown_secs),
            last_nudge: None,
            last_status: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current overlay, for whatever renders this surface.
    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    /// Apply one update.  Returns a line to announce, if any: a nudge when
    /// posture turns bad (subject to the cooldown), or the periodic
    /// feedback message.
    pub fn apply(&mut self, update: &SurfaceUpdate) -> Option<String> {
        match update {
            SurfaceUpdate::Angle { angle } => {
                self.overlay = OverlayState::for_angle(*angle);
                let status = PostureStatus::from_angle(*angle);
                let entered_bad =
                    status == PostureStatus::Bad && self.last_status != Some(PostureStatus::Bad);
                self.last_status = Some(status);

                if entered_bad && self.cooldown_elapsed() {
                    self.last_nudge = Some(Instant::now());
                    return Some(status.message().to_string());
                }
                None
            }
            SurfaceUpdate::Feedback { stats } => {
                let line = select_message(stats.good_percentage(), &mut *self.rng);
                Some(format!(
                    "{line} ({:.0}% good over {} frames)",
                    stats.good_percentage(),
                    stats.total_frames
                ))
            }
        }
    }

    fn cooldown_elapsed(&self) -> bool {
        match self.last_nudge {
            Some(at) => at.elapsed() >= self.nudge_cooldown,
            None => true,
        }
    }
}

// ---------------------------------------------------------------------------
// run_surface
// ---------------------------------------------------------------------------

/// Drive a surface from the coordinator's fan-out channel until it closes.
///
/// Announcements go to the log; a graphical front end would render
/// [`PresentationSurface::overlay`] instead.
pub async fn run_surface(mut surface: PresentationSurface, mut rx: mpsc::Receiver<SurfaceUpdate>) {
    while let Some(update) = rx.recv().await {
        if let Some(line) = surface.apply(&update) {
            info!("surface[{}]: {line}", surface.name());
        }
    }
    info!("surface[{}]: update channel closed", surface.name());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
