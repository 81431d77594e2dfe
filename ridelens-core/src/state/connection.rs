//! Per-adapter connection state

use heapless::String;

/// Maximum length of an error description
pub const ERROR_MESSAGE_LEN: usize = 48;

/// Human readable error description
pub type ErrorMessage = String<ERROR_MESSAGE_LEN>;

/// Connection state of one adapter
///
/// `R` is what the adapter is connected to (a peripheral for the glasses,
/// a device description for the ride computer).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState<R> {
    /// Not connected and not trying
    Disconnected,
    /// Looking for peripherals
    Scanning,
    /// Connection requested, waiting for completion
    Connecting,
    /// Link established
    Connected(R),
    /// Waiting for or performing reconnect attempt `n`
    Reconnecting(u8),
    /// Failed; needs an explicit action to leave
    Error(ErrorMessage),
}

impl<R> Default for ConnectionState<R> {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

impl<R> ConnectionState<R> {
    /// Build an error state, truncating the message if needed
    pub fn error(message: &str) -> Self {
        let mut msg = ErrorMessage::new();
        for c in message.chars() {
            if msg.push(c).is_err() {
                break;
            }
        }
        ConnectionState::Error(msg)
    }

    /// Check if the link is up
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }

    /// Check if an operation is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ConnectionState::Scanning | ConnectionState::Connecting | ConnectionState::Reconnecting(_)
        )
    }

    /// Check if this is an error state
    pub fn is_error(&self) -> bool {
        matches!(self, ConnectionState::Error(_))
    }

    /// What the adapter is connected to
    pub fn peer(&self) -> Option<&R> {
        match self {
            ConnectionState::Connected(peer) => Some(peer),
            _ => None,
        }
    }
}
