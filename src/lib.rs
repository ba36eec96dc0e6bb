//! acage - run an autonomous coding agent inside a locked-down container.
//!
//! The host's working directory becomes the agent's `/workspace`, bound
//! read-write, with an overlay-mount plan layered on top that hides or
//! read-only-exposes parts of the tree according to a glob-pattern policy.

pub mod config;
pub mod overlay;
pub mod runtime;
pub mod setup;
pub mod utils;
