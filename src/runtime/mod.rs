//! Container runtime integration.
//!
//! Consumes the overlay planner's output: [`docker`] turns the ordered mount
//! plan into a `docker run` invocation and [`manager`] drives the whole run
//! from bootstrap to the final process-replacing exec.

pub mod docker;
pub mod manager;
