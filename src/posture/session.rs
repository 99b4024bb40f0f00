//! Per-session posture counters.
//!
//! [`SessionAggregator`] consumes one classification per detection tick and
//! maintains the running totals a presentation surface (and the backend
//! report) need.  Bad posture is counted as *transitions into* bad — a
//! sustained slouch is one event, not one event per frame — so the
//! "corrections needed" number the backend shows is not inflated by tick
//! rate.
//!
//! Elapsed time is wall-clock from session start, recomputed on demand, so
//! it does not drift with the detection tick.

use std::time::Instant;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionStats
// ---------------------------------------------------------------------------

/// Immutable snapshot of one monitoring session's counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Frames classified as good posture.
    pub good_frames: u64,
    /// All frames with a known (pose-detected) classification.
    pub total_frames: u64,
    /// Number of good→bad edges observed.
    pub bad_transitions: u64,
    /// Wall-clock seconds since the session started.
    pub elapsed_secs: u64,
}

impl SessionStats {
    /// Good-posture percentage in `[0, 100]`; `0.0` before any frame is seen.
    pub fn good_percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.good_frames as f64 / self.total_frames as f64 * 100.0
    }
}

// ---------------------------------------------------------------------------
// SessionAggregator
// ---------------------------------------------------------------------------

/// Running counters for the active monitoring session.
///
/// Owned by the detection loop for the lifetime of one session; presentation
/// surfaces only ever see [`SessionStats`] snapshots.
#[derive(Debug, Default)]
pub struct SessionAggregator {
    started_at: Option<Instant>,
    good_frames: u64,
    total_frames: u64,
    bad_transitions: u64,
    last_was_good: Option<bool>,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new session: zero all counters and record the start time.
    ///
    /// Idempotent while a session is already running — a second `start`
    /// without an intervening [`stop`](Self::stop) is a no-op, matching the
    /// at-most-one-session lifecycle invariant.
    pub fn start(&mut self) {
        if self.started_at.is_some() {
            return;
        }
        self.started_at = Some(Instant::now());
        self.good_frames = 0;
        self.total_frames = 0;
        self.bad_transitions = 0;
        self.last_was_good = None;
    }

    /// End the session.  Counters keep their final values until the next
    /// [`start`](Self::start); `elapsed_secs` stops advancing.
    pub fn stop(&mut self) {
        self.started_at = None;
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Record one known (pose-detected) classification.
    ///
    /// Frames with no detected pose are never passed here — they carry no
    /// posture information and must not dilute the percentage.
    pub fn observe(&mut self, is_good: bool) {
        self.total_frames += 1;
        if is_good {
            self.good_frames += 1;
        } else if self.last_was_good == Some(true) {
            // Only the edge into bad posture counts.
            self.bad_transitions += 1;
        }
        self.last_was_good = Some(is_good);
    }

    /// Current counters as a plain value.
    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            good_frames: self.good_frames,
            total_frames: self.total_frames,
            bad_transitions: self.bad_transitions,
            elapsed_secs: self
                .started_at
                .map(|t| t.elapsed().as_secs())
                .unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(agg: &mut SessionAggregator, frames: &[bool]) {
        for &good in frames {
            agg.observe(good);
        }
    }

    #[test]
    fn counts_only_edges_into_bad() {
        let mut agg = SessionAggregator::new();
        agg.start();
        feed(&mut agg, &[true, true, false, false, true]);

        let stats = agg.snapshot();
        assert_eq!(stats.good_frames, 3);
        assert_eq!(stats.total_frames, 5);
        assert_eq!(stats.bad_transitions, 1);
    }

    #[test]
    fn starting_with_bad_posture_is_not_a_transition() {
        let mut agg = SessionAggregator::new();
        agg.start();
        feed(&mut agg, &[false, false]);
        assert_eq!(agg.snapshot().bad_transitions, 0);
    }

    #[test]
    fn repeated_slouch_recovery_cycles_count_each_edge() {
        let mut agg = SessionAggregator::new();
        agg.start();
        feed(&mut agg, &[true, false, true, false, true, false]);
        assert_eq!(agg.snapshot().bad_transitions, 3);
    }

    #[test]
    fn start_is_idempotent_while_running() {
        let mut agg = SessionAggregator::new();
        agg.start();
        feed(&mut agg, &[true, false]);

        agg.start(); // must not reset
        let stats = agg.snapshot();
        assert_eq!(stats.total_frames, 2);
        assert_eq!(stats.good_frames, 1);
    }

    #[test]
    fn restart_after_stop_resets_counters() {
        let mut agg = SessionAggregator::new();
        agg.start();
        feed(&mut agg, &[true, true, false]);
        agg.stop();

        agg.start();
        let stats = agg.snapshot();
        assert_eq!(stats.total_frames, 0);
        assert_eq!(stats.good_frames, 0);
        assert_eq!(stats.bad_transitions, 0);
    }

    #[test]
    fn good_percentage_handles_empty_session() {
        let agg = SessionAggregator::new();
        assert_eq!(agg.snapshot().good_percentage(), 0.0);
    }

    #[test]
    fn good_percentage_matches_counters() {
        let mut agg = SessionAggregator::new();
        agg.start();
        feed(&mut agg, &[true, true, true, false]);
        assert!((agg.snapshot().good_percentage() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn elapsed_is_zero_before_start() {
        let agg = SessionAggregator::new();
        assert_eq!(agg.snapshot().elapsed_secs, 0);
    }
}
