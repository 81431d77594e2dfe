//! Coordinator event loop
//!
//! Waits for the next mailbox event or the coordinator's nearest deadline,
//! whichever comes first, and publishes status changes after every step.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Instant, Timer};

use ridelens_core::coordinator::Coordinator;
use ridelens_core::state::Event;
use ridelens_core::traits::{SinkTransport, SourceTransport};

use crate::channels::{PAIRED_ADDRESS, STATUS};

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

fn publish<S: SourceTransport, T: SinkTransport>(coordinator: &mut Coordinator<S, T>) {
    if let Some(status) = coordinator.take_status_change() {
        STATUS.sender().send(status);
    }
    if let Some(address) = coordinator.take_paired_address() {
        info!("paired with {}", address.as_str());
        PAIRED_ADDRESS.signal(address);
    }
}

/// Drive the coordinator until a `Shutdown` event has been handled
pub async fn run_coordinator<S, T, const N: usize>(
    coordinator: &mut Coordinator<S, T>,
    events: Receiver<'_, CriticalSectionRawMutex, Event, N>,
) where
    S: SourceTransport,
    T: SinkTransport,
{
    info!("coordinator task started");
    coordinator.start(now_ms());
    publish(coordinator);

    while !coordinator.is_shut_down() {
        let deadline = coordinator
            .next_deadline()
            .map_or(Instant::MAX, Instant::from_millis);

        match select(events.receive(), Timer::at(deadline)).await {
            Either::First(event) => {
                trace!("event {:?}", event);
                let now = now_ms();
                coordinator.handle(event, now);
                // overdue timers still fire while the mailbox stays busy
                if coordinator.next_deadline().is_some_and(|due| due <= now) {
                    coordinator.poll(now);
                }
            }
            Either::Second(()) => coordinator.poll(now_ms()),
        }
        publish(coordinator);
    }

    info!("coordinator task stopped");
}
