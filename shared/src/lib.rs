//! Shared types and utilities for Warden
//!
//! Domain records produced by the gateway's audit pipeline and rendered by
//! the operator CLI.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{counters::*, event::*};
