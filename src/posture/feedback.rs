//! Periodic feedback message selection.
//!
//! Every feedback interval the detection loop computes the rolling
//! good-posture percentage and asks this module for an encouragement or
//! correction line.  The percentage maps to a [`FeedbackCategory`] with
//! inclusive lower bounds (exactly 90 is still excellent), and the message
//! is drawn uniformly at random from that category's fixed pool.
//!
//! The random source is passed in by the caller so tests can assert pool
//! membership with a seeded generator.

use rand::seq::SliceRandom;
use rand::Rng;

// ---------------------------------------------------------------------------
// FeedbackCategory
// ---------------------------------------------------------------------------

/// Coarse rating of the rolling good-posture percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCategory {
    /// 90% and above.
    Excellent,
    /// 70% up to (excluding) 90%.
    Good,
    /// 50% up to (excluding) 70%.
    Fair,
    /// Below 50%.
    Poor,
}

const EXCELLENT_MESSAGES: &[&str] = &[
    "Outstanding posture this session — keep it going!",
    "Your back thanks you. Excellent work!",
    "Near-perfect posture. You make it look easy.",
    "Fantastic! You barely slouched at all.",
];

const GOOD_MESSAGES: &[&str] = &[
    "Solid posture overall — a few slips, nothing serious.",
    "Good work. Stay mindful of your shoulders.",
    "Mostly upright this session. Keep building the habit.",
    "Nice job — just a little more consistency and you're golden.",
];

const FAIR_MESSAGES: &[&str] = &[
    "You slouched about half the time. Try raising your screen.",
    "Mixed results — check in with your shoulders every few minutes.",
    "Room to improve. A quick stretch break might help.",
    "Halfway there. Reset your sitting position when you notice drifting.",
];

const POOR_MESSAGES: &[&str] = &[
    "Your posture needs attention — sit back and straighten up.",
    "Lots of slouching this session. Consider a short walk.",
    "Time for a reset: feet flat, shoulders back, screen at eye level.",
    "Rough stretch. Stand up, stretch, and start fresh.",
];

impl FeedbackCategory {
    /// Categorise a good-posture percentage in `[0, 100]`.
    ///
    /// Breakpoints are inclusive on the lower bound: exactly 90 is
    /// `Excellent`, exactly 70 is `Good`, exactly 50 is `Fair`.
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 90.0 {
            FeedbackCategory::Excellent
        } else if pct >= 70.0 {
            FeedbackCategory::Good
        } else if pct >= 50.0 {
            FeedbackCategory::Fair
        } else {
            FeedbackCategory::Poor
        }
    }

    /// The fixed message pool for this category.  Never empty.
    pub fn pool(&self) -> &'static [&'static str] {
        match self {
            FeedbackCategory::Excellent => EXCELLENT_MESSAGES,
            FeedbackCategory::Good => GOOD_MESSAGES,
            FeedbackCategory::Fair => FAIR_MESSAGES,
            FeedbackCategory::Poor => POOR_MESSAGES,
        }
    }
}

/// Pick a feedback line for the given good-posture percentage.
///
/// Selection within the category is uniformly random and intentionally not
/// reproducible in production; pass a seeded [`Rng`] in tests.
pub fn select_message<R: Rng + ?Sized>(good_percentage: f64, rng: &mut R) -> &'static str {
    let pool = FeedbackCategory::from_percentage(good_percentage).pool();
    // Pools are non-empty by construction.
    pool.choose(rng).copied().unwrap_or(pool[0])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
