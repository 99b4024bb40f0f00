//! Angle → visual feedback mapping.
//!
//! [`classify`] converts a measured shoulder/neck deviation angle into the
//! blur intensity and overlay opacity a presentation surface should apply.
//! It is a total function over all finite angles with two documented
//! breakpoints:
//!
//! * `angle >= 80°` — good posture, no blur.
//! * `angle <= 40°` — worst posture, maximum blur.
//! * in between — linear ramp, 2 px blur and 0.018 opacity per degree below
//!   the good-posture threshold.
//!
//! A missing pose (required landmarks absent) is **not** an input to this
//! function.  Callers signal that case separately and show a "position
//! yourself" prompt instead of classifying — see
//! [`crate::surface::OverlayState::pose_lost`].

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Angles at or above this value count as good posture.
pub const GOOD_POSTURE_THRESHOLD: f64 = 80.0;

/// Angles at or below this value receive the maximum blur.
pub const MIN_ANGLE: f64 = 40.0;

/// Blur applied at or below [`MIN_ANGLE`].
const MAX_BLUR_PX: f64 = 80.0;

/// Overlay opacity applied at or below [`MIN_ANGLE`].
const MAX_OPACITY: f64 = 0.7;

/// Blur gained per degree below [`GOOD_POSTURE_THRESHOLD`].
const BLUR_PER_DEGREE: f64 = 2.0;

/// Opacity gained per degree below [`GOOD_POSTURE_THRESHOLD`].
const OPACITY_PER_DEGREE: f64 = 0.018;

// ---------------------------------------------------------------------------
// PostureStatus
// ---------------------------------------------------------------------------

/// Three-way posture category derived from an angle sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureStatus {
    /// Angle at or above the good-posture threshold.
    Good,
    /// Angle strictly between the minimum and the good-posture threshold.
    Degrading,
    /// Angle at or below the minimum.
    Bad,
}

impl PostureStatus {
    /// Categorise an angle using the same inequalities as [`classify`].
    pub fn from_angle(angle: f64) -> Self {
        if angle >= GOOD_POSTURE_THRESHOLD {
            PostureStatus::Good
        } else if angle <= MIN_ANGLE {
            PostureStatus::Bad
        } else {
            PostureStatus::Degrading
        }
    }

    /// Indicator colour shown next to the status text.
    pub fn indicator(&self) -> IndicatorColor {
        match self {
            PostureStatus::Good => IndicatorColor::Green,
            PostureStatus::Degrading => IndicatorColor::Orange,
            PostureStatus::Bad => IndicatorColor::Red,
        }
    }

    /// Human-readable feedback line for this category.
    pub fn message(&self) -> &'static str {
        match self {
            PostureStatus::Good => "Good posture — keep it up",
            PostureStatus::Degrading => "You are starting to slouch — straighten your back",
            PostureStatus::Bad => "Severe slouch detected — sit upright",
        }
    }

    /// Status string used in backend posture logs (`posture_status` field).
    pub fn as_log_str(&self) -> &'static str {
        match self {
            PostureStatus::Good => "good",
            PostureStatus::Degrading => "degrading",
            PostureStatus::Bad => "bad",
        }
    }
}

/// Traffic-light indicator colour for presentation surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorColor {
    Green,
    Orange,
    Red,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Visual feedback derived from one angle sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Backdrop blur radius in pixels.
    pub blur_px: f64,
    /// Dark-overlay opacity in `[0, 1]`.
    pub overlay_opacity: f64,
    /// `true` when the angle meets the good-posture threshold.
    pub is_good: bool,
}

/// Map an angle in degrees to its visual feedback.
///
/// Boundary behaviour is inclusive on both breakpoints: exactly 80° is good
/// (no blur), exactly 40° is the maximum blur.  Values between the
/// breakpoints are a linear ramp and are not clamped further.
pub fn classify(angle: f64) -> Classification {
    if angle >= GOOD_POSTURE_THRESHOLD {
        Classification {
            blur_px: 0.0,
            overlay_opacity: 0.0,
            is_good: true,
        }
    } else if angle <= MIN_ANGLE {
        Classification {
            blur_px: MAX_BLUR_PX,
            overlay_opacity: MAX_OPACITY,
            is_good: false,
        }
    } else {
        let degrees_below = GOOD_POSTURE_THRESHOLD - angle;
        Classification {
            blur_px: degrees_below * BLUR_PER_DEGREE,
            overlay_opacity: degrees_below * OPACITY_PER_DEGREE,
            is_good: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_or_above_threshold_is_clear() {
        for angle in [80.0, 80.1, 95.0, 180.0, f64::MAX] {
            let c = classify(angle);
            assert_eq!(c.blur_px, 0.0, "angle {angle}");
            assert_eq!(c.overlay_opacity, 0.0, "angle {angle}");
            assert!(c.is_good, "angle {angle}");
        }
    }

    #[test]
    fn at_or_below_minimum_is_maximum_blur() {
        for angle in [40.0, 39.9, 10.0, 0.0, -5.0] {
            let c = classify(angle);
            assert_eq!(c.blur_px, 80.0, "angle {angle}");
            assert_eq!(c.overlay_opacity, 0.7, "angle {angle}");
            assert!(!c.is_good, "angle {angle}");
        }
    }

    #[test]
    fn sixty_degrees_is_midpoint_of_ramp() {
        let c = classify(60.0);
        assert_eq!(c.blur_px, 40.0);
        assert!((c.overlay_opacity - 0.36).abs() < 1e-9);
        assert!(!c.is_good);
    }

    #[test]
    fn ramp_edges_just_inside_breakpoints() {
        let near_good = classify(79.0);
        assert_eq!(near_good.blur_px, 2.0);
        assert!((near_good.overlay_opacity - 0.018).abs() < 1e-9);

        let near_bad = classify(41.0);
        assert_eq!(near_bad.blur_px, 78.0);
        assert!((near_bad.overlay_opacity - 0.702).abs() < 1e-9);
    }

    #[test]
    fn blur_and_opacity_are_monotonic_non_increasing_in_angle() {
        let mut prev = classify(-10.0);
        let mut angle = -9.5;
        while angle <= 120.0 {
            let cur = classify(angle);
            assert!(
                cur.blur_px <= prev.blur_px,
                "blur increased between {} and {angle}",
                angle - 0.5
            );
            assert!(
                cur.overlay_opacity <= prev.overlay_opacity,
                "opacity increased between {} and {angle}",
                angle - 0.5
            );
            prev = cur;
            angle += 0.5;
        }
    }

    #[test]
    fn status_matches_classify_breakpoints() {
        assert_eq!(PostureStatus::from_angle(80.0), PostureStatus::Good);
        assert_eq!(PostureStatus::from_angle(79.9), PostureStatus::Degrading);
        assert_eq!(PostureStatus::from_angle(40.1), PostureStatus::Degrading);
        assert_eq!(PostureStatus::from_angle(40.0), PostureStatus::Bad);
    }

    #[test]
    fn indicator_colours_follow_status() {
        assert_eq!(PostureStatus::Good.indicator(), IndicatorColor::Green);
        assert_eq!(PostureStatus::Degrading.indicator(), IndicatorColor::Orange);
        assert_eq!(PostureStatus::Bad.indicator(), IndicatorColor::Red);
    }

    #[test]
    fn log_strings_are_stable() {
        assert_eq!(PostureStatus::Good.as_log_str(), "good");
        assert_eq!(PostureStatus::Degrading.as_log_str(), "degrading");
        assert_eq!(PostureStatus::Bad.as_log_str(), "bad");
    }
}
