//! Connection and bridge state machines
//!
//! Each adapter owns a [`ConnectionState`]; the coordinator derives the
//! overall [`BridgeState`] from the pair.

pub mod bridge;
pub mod connection;
pub mod events;

pub use bridge::{BridgeState, BridgeStatus};
pub use connection::{ConnectionState, ErrorMessage};
pub use events::Event;
