//! Posture monitor — webcam-based slouch detection with progressive visual
//! feedback.
//!
//! # Architecture
//!
//! The system is split into isolated contexts that communicate only through
//! the relay:
//!
//! * [`pose`] — the capture context: camera frames in, angle samples out,
//!   driven by a fixed detection tick.
//! * [`posture`] — pure domain logic: angle classification, periodic
//!   feedback selection, and per-session aggregation.
//! * [`relay`] — the coordinator owning the monitoring lifecycle, plus the
//!   message shapes and the persisted status blob.
//! * [`surface`] — presentation: overlay state and rate-limited nudges,
//!   fed by the coordinator's fan-out.
//! * [`report`] — optional session reporting to the companion backend.
//! * [`config`] — settings, defaults and platform paths.

pub mod config;
pub mod pose;
pub mod posture;
pub mod relay;
pub mod report;
pub mod surface;
