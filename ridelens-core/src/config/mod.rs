//! Configuration types
//!
//! Plain data read by the coordinator. Loading and persisting it is the
//! host's job.

pub mod types;

pub use types::*;
