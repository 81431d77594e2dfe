//! Board-agnostic core logic for the ride-to-glasses bridge
//!
//! This crate contains all bridge logic that does not depend on a specific
//! BLE stack or telemetry SDK:
//!
//! - Layout template catalog and geometry builder
//! - Metric catalog and the pending-value snapshot
//! - Connection and bridge state machines
//! - Transport traits for the glasses (sink) and the ride computer (source)
//! - Sink and source adapters
//! - The bridge coordinator: throttled flushing, streaming lifecycle and
//!   reconnection policies
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod adapter;
pub mod config;
pub mod coordinator;
pub mod geometry;
pub mod metrics;
pub mod snapshot;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
