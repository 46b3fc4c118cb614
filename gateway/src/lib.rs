//! Warden gateway library
//!
//! Access control, audit fan-out and call statistics in front of a gRPC
//! server. [`server::Gateway`] wires the pieces together.

pub mod acl;
pub mod audit;
pub mod config;
pub mod hub;
pub mod metrics;
pub mod server;
pub mod stats;
pub mod subscriber;

pub use acl::AccessList;
pub use hub::EventHub;
pub use stats::StatTracker;
pub use subscriber::SubscriberId;
