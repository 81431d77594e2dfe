//! Console transports
//!
//! Stand-ins for the vendor SDKs. Every primitive is logged, and the
//! completions a real stack would report asynchronously are posted to the
//! coordinator mailbox straight away.

use log::{debug, info, warn};

use ridelens_bridge::post;
use ridelens_core::metrics::RideState;
use ridelens_core::state::Event;
use ridelens_core::traits::{
    Peripheral, Point, SinkTransport, SourceDevice, SourceTransport, Stream, SubscriptionId,
    TransportError,
};

/// Address of the simulated glasses
pub const GLASSES_ADDRESS: &str = "E2:4A:11:07:5C:90";

const GLASSES_NAME: &str = "Even G1_L";
const SOURCE_NAME: &str = "Karoo 3";

/// Glasses that are always in range
#[derive(Debug, Default)]
pub struct ConsoleSink {
    connected: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn link(&self) -> Result<(), TransportError> {
        if self.connected {
            Ok(())
        } else {
            Err(TransportError::Unavailable)
        }
    }
}

impl SinkTransport for ConsoleSink {
    fn start_scan(&mut self) -> Result<(), TransportError> {
        info!("[glasses] scanning");
        let peripheral =
            Peripheral::new(GLASSES_ADDRESS, GLASSES_NAME, -58).ok_or(TransportError::Io)?;
        post(Event::SinkDiscovered(peripheral));
        Ok(())
    }

    fn stop_scan(&mut self) {
        debug!("[glasses] scan stopped");
    }

    fn connect(&mut self, peripheral: &Peripheral) -> Result<(), TransportError> {
        info!("[glasses] connecting to {}", peripheral.address.as_str());
        self.connected = true;
        post(Event::SinkConnected(peripheral.clone()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        info!("[glasses] disconnected");
        self.connected = false;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        self.link()?;
        debug!("[glasses] clear");
        Ok(())
    }

    fn write_text(
        &mut self,
        pos: Point,
        rotation: u8,
        font: u8,
        color: u8,
        text: &str,
    ) -> Result<(), TransportError> {
        self.link()?;
        info!(
            "[glasses] text ({:>3},{:>3}) font {} rot {} color {}: {}",
            pos.x, pos.y, font, rotation, color, text
        );
        Ok(())
    }

    fn write_line(&mut self, p0: Point, p1: Point) -> Result<(), TransportError> {
        self.link()?;
        debug!("[glasses] line ({},{}) -> ({},{})", p0.x, p0.y, p1.x, p1.y);
        Ok(())
    }

    fn write_image(&mut self, id: u8, pos: Point) -> Result<(), TransportError> {
        self.link()?;
        debug!("[glasses] image {} at ({},{})", id, pos.x, pos.y);
        Ok(())
    }

    fn save_layout(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.link()?;
        info!(
            "[glasses] save layout {} ({} bytes)",
            frame.first().copied().unwrap_or_default(),
            frame.len()
        );
        debug!("[glasses] frame {:02X?}", frame);
        Ok(())
    }

    fn display_layout(&mut self, id: u8, value: &str) -> Result<(), TransportError> {
        self.link()?;
        info!("[glasses] layout {}: {}", id, value);
        Ok(())
    }

    fn delete_layout(&mut self, id: u8) -> Result<(), TransportError> {
        self.link()?;
        debug!("[glasses] delete layout {}", id);
        Ok(())
    }
}

/// Ride computer that accepts every subscription
#[derive(Debug)]
pub struct ConsoleSource {
    ride: RideState,
    next_id: u32,
}

impl ConsoleSource {
    /// `ride` is reported when the ride state stream is subscribed
    pub fn new(ride: RideState) -> Self {
        Self { ride, next_id: 1 }
    }
}

impl SourceTransport for ConsoleSource {
    fn connect(&mut self) -> Result<(), TransportError> {
        info!("[source] connecting");
        let mut device = SourceDevice::default();
        if device.name.push_str(SOURCE_NAME).is_err() {
            warn!("[source] device name truncated");
        }
        post(Event::SourceConnected(device));
        Ok(())
    }

    fn disconnect(&mut self) {
        info!("[source] disconnected");
    }

    fn subscribe(&mut self, stream: Stream) -> Result<SubscriptionId, TransportError> {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        debug!("[source] subscribed {:?} as {}", stream, id.0);
        if stream == Stream::RideState {
            post(Event::RideStateChanged(self.ride));
        }
        Ok(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        debug!("[source] unsubscribed {}", id.0);
    }
}
