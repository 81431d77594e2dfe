//! Embassy runtime for the RideLens bridge
//!
//! Hosts the coordinator on a single task:
//! - `channels`: the event mailbox and the observable status
//! - `runner`: the coordinator event loop
//! - `config`: the TOML settings file

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod channels;
pub mod config;
pub mod runner;

pub use channels::{post, EVENTS, PAIRED_ADDRESS, STATUS};
pub use config::{load_settings, ConfigError, LoadedConfig};
pub use runner::run_coordinator;
