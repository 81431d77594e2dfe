//! Coordinator mailbox and status channels
//!
//! Transports and the host only ever post events here; the coordinator task
//! is the single consumer.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use embassy_sync::watch::Watch;

use ridelens_core::state::{BridgeStatus, Event};
use ridelens_core::traits::Address;

/// Mailbox capacity
pub const EVENT_CHANNEL_SIZE: usize = 32;

/// Maximum concurrent status observers
pub const STATUS_RECEIVERS: usize = 4;

/// Transport callbacks and external intents
pub static EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> = Channel::new();

/// Latest bridge status (updated by the coordinator task)
pub static STATUS: Watch<CriticalSectionRawMutex, BridgeStatus, STATUS_RECEIVERS> = Watch::new();

/// Address of newly paired glasses, for the host to persist
pub static PAIRED_ADDRESS: Signal<CriticalSectionRawMutex, Address> = Signal::new();

/// Enqueue an event without blocking
///
/// Returns false if the mailbox is full and the event was dropped.
pub fn post(event: Event) -> bool {
    match EVENTS.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(event)) => {
            warn!("mailbox full, dropping {:?}", event);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridelens_core::metrics::{Metric, RideState};

    #[test]
    fn test_post_until_full() {
        for i in 0..EVENT_CHANNEL_SIZE {
            assert!(post(Event::MetricSample(Metric::Power, i as f32)));
        }
        assert!(!post(Event::RideStateChanged(RideState::Recording)));

        assert_eq!(
            EVENTS.try_receive().ok(),
            Some(Event::MetricSample(Metric::Power, 0.0))
        );
        while EVENTS.try_receive().is_ok() {}
        assert!(post(Event::Shutdown));
        assert_eq!(EVENTS.try_receive().ok(), Some(Event::Shutdown));
    }
}
