//! Audit and statistics record types

pub mod counters;
pub mod event;
