//! Ride computer transport trait

use heapless::String;

use super::TransportError;
use crate::metrics::Metric;

/// Identifier handed out by the transport for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionId(pub u32);

/// A push stream offered by the ride computer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stream {
    /// Recording state changes
    RideState,
    /// Numeric samples for one metric
    Metric(Metric),
}

/// The connected ride computer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SourceDevice {
    pub name: String<24>,
}

/// Trait for the ride computer telemetry transport
///
/// Connection completion arrives as `SourceConnected` / `SourceConnectFailed`,
/// link loss as `SourceDisconnected`, and stream data as `RideStateChanged`,
/// `MetricSample` and `SubscriptionError` events.
pub trait SourceTransport {
    /// Initiate a connection to the ride computer service
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Drop the connection
    fn disconnect(&mut self);

    /// Register a push subscription
    fn subscribe(&mut self, stream: Stream) -> Result<SubscriptionId, TransportError>;

    /// Cancel a push subscription
    fn unsubscribe(&mut self, id: SubscriptionId);
}
