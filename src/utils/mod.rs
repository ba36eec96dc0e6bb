//! Shared utility modules.
//!
//! Currently just the glob pattern engine used by the overlay-mount planner's
//! policy matching.

pub mod glob;
