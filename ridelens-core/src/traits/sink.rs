//! Glasses transport trait

use heapless::String;

use super::TransportError;

/// Length of a textual BLE address ("AA:BB:CC:DD:EE:FF")
pub const ADDRESS_LEN: usize = 17;

/// Maximum advertised name length kept for a peripheral
pub const NAME_LEN: usize = 24;

/// BLE address of a peripheral
pub type Address = String<ADDRESS_LEN>;

/// A discovered pair of glasses
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Peripheral {
    pub address: Address,
    pub name: String<NAME_LEN>,
    pub rssi: i16,
}

impl Peripheral {
    /// Build a peripheral, truncating an over-long name
    ///
    /// Returns `None` if `address` is longer than [`ADDRESS_LEN`].
    pub fn new(address: &str, name: &str, rssi: i16) -> Option<Self> {
        let mut addr = Address::new();
        addr.push_str(address).ok()?;

        let mut short_name = String::new();
        for c in name.chars() {
            if short_name.push(c).is_err() {
                break;
            }
        }

        Some(Self {
            address: addr,
            name: short_name,
            rssi,
        })
    }
}

/// Absolute display position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Trait for the glasses BLE transport
///
/// Discovery results, connection completion and link loss are reported
/// asynchronously as `SinkDiscovered`, `SinkConnected`, `SinkConnectFailed`
/// and `SinkDisconnected` events.
pub trait SinkTransport {
    /// Start scanning for glasses
    fn start_scan(&mut self) -> Result<(), TransportError>;

    /// Stop an ongoing scan
    fn stop_scan(&mut self);

    /// Initiate a connection to a discovered peripheral
    fn connect(&mut self, peripheral: &Peripheral) -> Result<(), TransportError>;

    /// Drop the current connection
    fn disconnect(&mut self) -> Result<(), TransportError>;

    /// Clear the whole display
    fn clear(&mut self) -> Result<(), TransportError>;

    /// Draw text
    ///
    /// - `pos`: Absolute position of the text anchor
    /// - `rotation`: Firmware rotation code (4 = upright)
    /// - `font`: Font id (1-3)
    /// - `color`: Grey level (0-15)
    fn write_text(
        &mut self,
        pos: Point,
        rotation: u8,
        font: u8,
        color: u8,
        text: &str,
    ) -> Result<(), TransportError>;

    /// Draw a line
    fn write_line(&mut self, p0: Point, p1: Point) -> Result<(), TransportError>;

    /// Draw a pre-loaded image asset
    fn write_image(&mut self, id: u8, pos: Point) -> Result<(), TransportError>;

    /// Store an encoded layout frame in glasses memory
    fn save_layout(&mut self, _frame: &[u8]) -> Result<(), TransportError> {
        Err(TransportError::Unsupported)
    }

    /// Show a stored layout with a value
    fn display_layout(&mut self, _id: u8, _value: &str) -> Result<(), TransportError> {
        Err(TransportError::Unsupported)
    }

    /// Remove a stored layout
    fn delete_layout(&mut self, _id: u8) -> Result<(), TransportError> {
        Err(TransportError::Unsupported)
    }
}
