//! Transport abstraction traits
//!
//! These traits define the interface between the bridge logic and the
//! vendor BLE / telemetry stacks. Operations only initiate work; completion
//! and unsolicited notifications are posted back to the coordinator as
//! [`Event`](crate::state::Event)s.

pub mod sink;
pub mod source;

pub use sink::{Address, Peripheral, Point, SinkTransport, ADDRESS_LEN};
pub use source::{SourceDevice, SourceTransport, Stream, SubscriptionId};

use core::fmt;

/// Errors reported by a transport primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Radio or service not available
    Unavailable,
    /// Peer refused the request
    Rejected,
    /// Operation timed out
    Timeout,
    /// Primitive not implemented by this transport
    Unsupported,
    /// Low-level I/O failure
    Io,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            TransportError::Unavailable => "transport unavailable",
            TransportError::Rejected => "request rejected",
            TransportError::Timeout => "operation timed out",
            TransportError::Unsupported => "operation unsupported",
            TransportError::Io => "i/o failure",
        };
        f.write_str(msg)
    }
}
