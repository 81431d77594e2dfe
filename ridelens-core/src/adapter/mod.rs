//! Connection adapters
//!
//! Thin state machines around the transports. Transport failures are logged
//! and reflected in the adapter's [`ConnectionState`](crate::state::ConnectionState);
//! they never escape to the caller.

pub mod sink;
pub mod source;

pub use sink::{SinkAdapter, MAX_DISCOVERED};
pub use source::{BackoffPolicy, SourceAdapter};
