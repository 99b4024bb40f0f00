//! Pure posture core: angle classification, feedback selection, and
//! per-session aggregation.  No I/O, no async — everything here is a plain
//! function of its inputs so the detection loop and presentation surfaces
//! can share it freely.

pub mod classifier;
pub mod feedback;
pub mod session;

pub use classifier::{
    classify, Classification, IndicatorColor, PostureStatus, GOOD_POSTURE_THRESHOLD, MIN_ANGLE,
};
pub use feedback::{select_message, FeedbackCategory};
pub use session::{SessionAggregator, SessionStats};
