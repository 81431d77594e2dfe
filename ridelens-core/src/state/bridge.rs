//! Overall bridge state
//!
//! The bridge state is a pure function of the two connection states, except
//! for `Streaming`, which the coordinator enters and leaves explicitly.

use super::connection::{ConnectionState, ErrorMessage};
use crate::metrics::RideState;
use crate::traits::{Peripheral, SourceDevice};

/// Bridge states
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeState {
    /// Nothing connected
    #[default]
    Idle,
    /// Ride computer connection in progress
    SourceConnecting,
    /// Ride computer connected, glasses not
    SourceConnected,
    /// Looking for glasses
    SinkScanning,
    /// Glasses connection in progress
    SinkConnecting,
    /// Both sides connected
    FullyConnected,
    /// Both sides connected and ride data is flowing to the glasses
    Streaming,
    /// A side failed and needs attention
    Error(ErrorMessage),
}

impl BridgeState {
    /// Derive the bridge state from the adapter states
    ///
    /// `streaming` only has an effect while both sides are connected.
    pub fn derive<S, K>(
        source: &ConnectionState<S>,
        sink: &ConnectionState<K>,
        streaming: bool,
    ) -> Self {
        if let ConnectionState::Error(msg) = source {
            return BridgeState::Error(msg.clone());
        }
        if let ConnectionState::Error(msg) = sink {
            return BridgeState::Error(msg.clone());
        }

        match (source.is_connected(), sink.is_connected()) {
            (true, true) if streaming => BridgeState::Streaming,
            (true, true) => BridgeState::FullyConnected,
            (true, false) => match sink {
                ConnectionState::Scanning => BridgeState::SinkScanning,
                ConnectionState::Connecting => BridgeState::SinkConnecting,
                _ => BridgeState::SourceConnected,
            },
            (false, _) => match source {
                ConnectionState::Connecting | ConnectionState::Reconnecting(_) => {
                    BridgeState::SourceConnecting
                }
                _ => match sink {
                    ConnectionState::Scanning => BridgeState::SinkScanning,
                    ConnectionState::Connecting => BridgeState::SinkConnecting,
                    // glasses alone count as idle
                    _ => BridgeState::Idle,
                },
            },
        }
    }

    /// Check if ride data is flowing
    pub fn is_streaming(&self) -> bool {
        matches!(self, BridgeState::Streaming)
    }
}

/// Observable bridge status for presentation layers
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeStatus {
    pub bridge: BridgeState,
    pub source: ConnectionState<SourceDevice>,
    pub sink: ConnectionState<Peripheral>,
    pub ride: RideState,
    pub simulating: bool,
}
