//! Coordinator input events
//!
//! Transport callbacks and external intents share one mailbox so that the
//! coordinator processes them one at a time on a single context.

use crate::config::DisplayProfile;
use crate::metrics::{Metric, RideState};
use crate::traits::{Peripheral, SourceDevice, Stream};

/// Events processed by the coordinator
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    // Ride computer transport callbacks
    /// Source connection completed
    SourceConnected(SourceDevice),
    /// Source connection attempt failed
    SourceConnectFailed,
    /// Source link lost
    SourceDisconnected,
    /// A single subscription reported an error
    SubscriptionError(Stream),
    /// New numeric sample
    MetricSample(Metric, f32),
    /// Recording state changed
    RideStateChanged(RideState),

    // Glasses transport callbacks
    /// Scan result
    SinkDiscovered(Peripheral),
    /// Glasses connection completed
    SinkConnected(Peripheral),
    /// Glasses connection attempt failed
    SinkConnectFailed,
    /// Glasses link lost
    SinkDisconnected,

    // Intents
    /// Connect to the ride computer
    ConnectSource,
    /// Explicit reconnect, required after retries are exhausted
    ReconnectSource,
    /// Disconnect from the ride computer
    DisconnectSource,
    /// Scan and connect to the first glasses found
    StartManualScan,
    /// Abort the current scan
    StopScan,
    /// Connect to a specific pair of glasses
    ConnectSink(Peripheral),
    /// Disconnect the glasses
    DisconnectSink,
    /// Start streaming ride data to the glasses
    StartStreaming,
    /// Stop streaming ride data
    StopStreaming,
    /// Enable or disable synthetic ride data
    SetSimulation(bool),
    /// Replace the active display profile (`None` = legacy layout)
    ApplyProfile(Option<DisplayProfile>),
    /// Cancel every timer and disconnect both sides
    Shutdown,
}
