//! Layout descriptors and frame encoding
//!
//! Header format (17 bytes, multi-byte fields little-endian):
//! - LAYOUT ID (1 byte): glasses memory slot, 1-15
//! - COMMAND SIZE (1 byte): declared size of all commands
//! - CLIP X (2 bytes), CLIP Y (1 byte), CLIP WIDTH (2 bytes), CLIP HEIGHT (1 byte)
//! - FOREGROUND, BACKGROUND (1 byte each): 4-bit grey levels
//! - FONT (1 byte): 1-3
//! - TEXT VALID (1 byte): always 1
//! - TEXT X (2 bytes), TEXT Y (1 byte), TEXT ROTATION (1 byte), TEXT OPACITY (1 byte)

use core::fmt;

use heapless::Vec;

use crate::command::GraphicCommand;

/// Size of the fixed frame header
pub const HEADER_SIZE: usize = 17;

/// Maximum complete frame size accepted by the glasses
pub const MAX_FRAME_SIZE: usize = 126;

/// Maximum commands per layout
pub const MAX_COMMANDS: usize = 8;

/// Highest usable layout slot
pub const MAX_LAYOUT_ID: u8 = 15;

/// Highest grey level for foreground/background colors
pub const MAX_COLOR: u8 = 15;

/// Valid font ids
pub const MIN_FONT: u8 = 1;
pub const MAX_FONT: u8 = 3;

/// An encoded layout frame
pub type Frame = Vec<u8, MAX_FRAME_SIZE>;

/// Errors that can occur while encoding a layout
///
/// Every variant is a configuration bug on the caller's side; encoding is
/// never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Encoded frame would exceed [`MAX_FRAME_SIZE`]
    CapacityExceeded { size: usize },
    /// Layout id outside 1-15
    InvalidLayoutId(u8),
    /// Color outside 0-15
    InvalidColor(u8),
    /// Font outside 1-3
    InvalidFont(u8),
    /// Text command carries non-ASCII characters
    NonAsciiText,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::CapacityExceeded { size } => {
                write!(f, "frame of {} bytes exceeds {} bytes", size, MAX_FRAME_SIZE)
            }
            EncodeError::InvalidLayoutId(id) => write!(f, "layout id {} out of range", id),
            EncodeError::InvalidColor(color) => write!(f, "color {} out of range", color),
            EncodeError::InvalidFont(font) => write!(f, "font {} out of range", font),
            EncodeError::NonAsciiText => write!(f, "text is not ASCII"),
        }
    }
}

/// Pixel rectangle a layout draws into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClippingRegion {
    pub x: u16,
    pub y: u8,
    pub width: u16,
    pub height: u8,
}

impl ClippingRegion {
    pub const fn new(x: u16, y: u8, width: u16, height: u8) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Where the glasses draw the dynamic value of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TextConfig {
    pub x: u16,
    pub y: u8,
    pub rotation: u8,
    pub opacity: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            rotation: 4,
            opacity: true,
        }
    }
}

/// A complete layout ready for encoding
///
/// Created per render and discarded once transmitted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayoutDescriptor {
    /// Glasses memory slot (1-15)
    pub layout_id: u8,
    /// Drawing area; command coordinates are relative to it
    pub clip: ClippingRegion,
    /// Foreground grey level (0-15)
    pub fore_color: u8,
    /// Background grey level (0-15)
    pub back_color: u8,
    /// Font for the dynamic value (1-3)
    pub font: u8,
    /// Dynamic value placement
    pub text: TextConfig,
    /// Static decoration drawn before the value
    pub commands: Vec<GraphicCommand, MAX_COMMANDS>,
}

impl LayoutDescriptor {
    /// Create an empty layout with white-on-black medium text
    pub fn new(layout_id: u8, clip: ClippingRegion) -> Self {
        Self {
            layout_id,
            clip,
            fore_color: MAX_COLOR,
            back_color: 0,
            font: 2,
            text: TextConfig::default(),
            commands: Vec::new(),
        }
    }

    /// Sum of the command sizes announced in header byte 2
    pub fn declared_commands_size(&self) -> usize {
        self.commands.iter().map(GraphicCommand::declared_len).sum()
    }

    /// Total number of bytes [`encode`](Self::encode) will produce
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE
            + self
                .commands
                .iter()
                .map(GraphicCommand::encoded_len)
                .sum::<usize>()
    }

    /// Encode this layout into a frame
    pub fn encode(&self) -> Result<Frame, EncodeError> {
        self.validate()?;

        let size = self.encoded_len();
        if size > MAX_FRAME_SIZE {
            return Err(EncodeError::CapacityExceeded { size });
        }

        let mut header = [0u8; HEADER_SIZE];
        header[0] = self.layout_id;
        header[1] = self.declared_commands_size() as u8;
        header[2..4].copy_from_slice(&self.clip.x.to_le_bytes());
        header[4] = self.clip.y;
        header[5..7].copy_from_slice(&self.clip.width.to_le_bytes());
        header[7] = self.clip.height;
        header[8] = self.fore_color;
        header[9] = self.back_color;
        header[10] = self.font;
        header[11] = 1; // text valid
        header[12..14].copy_from_slice(&self.text.x.to_le_bytes());
        header[14] = self.text.y;
        header[15] = self.text.rotation;
        header[16] = self.text.opacity as u8;

        let mut frame = Frame::new();
        frame
            .extend_from_slice(&header)
            .map_err(|_| EncodeError::CapacityExceeded { size })?;
        for command in &self.commands {
            command.encode_into(&mut frame)?;
        }

        Ok(frame)
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.layout_id == 0 || self.layout_id > MAX_LAYOUT_ID {
            return Err(EncodeError::InvalidLayoutId(self.layout_id));
        }
        for color in [self.fore_color, self.back_color] {
            if color > MAX_COLOR {
                return Err(EncodeError::InvalidColor(color));
            }
        }
        if !(MIN_FONT..=MAX_FONT).contains(&self.font) {
            return Err(EncodeError::InvalidFont(self.font));
        }
        Ok(())
    }
}

/// Encode several layouts independently
///
/// Yields one result per layout; a failing layout does not affect the others.
pub fn encode_layouts(
    layouts: &[LayoutDescriptor],
) -> impl Iterator<Item = Result<Frame, EncodeError>> + '_ {
    layouts.iter().map(LayoutDescriptor::encode)
}
