//! Graphic commands carried inside a layout frame
//!
//! Each command starts with its command id byte followed by its operands.
//! Coordinates are relative to the layout's clipping region.

use heapless::{String, Vec};

use crate::layout::{EncodeError, MAX_FRAME_SIZE};

// Command ids understood by the glasses firmware
pub const CMD_CIRCLE: u8 = 3;
pub const CMD_LINE: u8 = 5;
pub const CMD_RECT: u8 = 7;
pub const CMD_TEXT: u8 = 9;
pub const CMD_IMAGE: u8 = 10;

/// Maximum text length carried by a single text command
pub const MAX_TEXT_LEN: usize = 32;

/// Bytes in front of the text payload: id, x(2), y, rotation, font, length
const TEXT_HEADER_LEN: usize = 7;

/// Size the firmware expects in front of a text payload.
///
/// The command-size byte of the frame header announces text commands as
/// `5 + len` even though [`TEXT_HEADER_LEN`] bytes are written. Deployed
/// firmware parses frames against this value, so it is kept as is.
const TEXT_DECLARED_HEADER_LEN: usize = 5;

/// A single drawing primitive inside a layout
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GraphicCommand {
    /// ASCII text at a position
    Text {
        x: i16,
        y: u8,
        rotation: u8,
        font: u8,
        text: String<MAX_TEXT_LEN>,
    },
    /// Straight line between two points
    Line { x0: i16, y0: i16, x1: i16, y1: i16 },
    /// Circle outline
    Circle { x: i16, y: i16, radius: u8 },
    /// Rectangle outline between two corners
    Rect { x0: i16, y0: i16, x1: i16, y1: i16 },
    /// Pre-loaded image asset
    Image { id: u8, x: i16, y: i16 },
}

impl GraphicCommand {
    /// Build a text command
    ///
    /// Returns `None` if `text` is longer than [`MAX_TEXT_LEN`] bytes.
    pub fn text(x: i16, y: u8, rotation: u8, font: u8, text: &str) -> Option<Self> {
        let mut owned = String::new();
        owned.push_str(text).ok()?;
        Some(GraphicCommand::Text {
            x,
            y,
            rotation,
            font,
            text: owned,
        })
    }

    /// Command id byte
    pub fn id(&self) -> u8 {
        match self {
            GraphicCommand::Text { .. } => CMD_TEXT,
            GraphicCommand::Line { .. } => CMD_LINE,
            GraphicCommand::Circle { .. } => CMD_CIRCLE,
            GraphicCommand::Rect { .. } => CMD_RECT,
            GraphicCommand::Image { .. } => CMD_IMAGE,
        }
    }

    /// Number of bytes this command occupies on the wire
    pub fn encoded_len(&self) -> usize {
        match self {
            GraphicCommand::Text { text, .. } => TEXT_HEADER_LEN + text.len(),
            GraphicCommand::Line { .. } | GraphicCommand::Rect { .. } => 9,
            GraphicCommand::Circle { .. } | GraphicCommand::Image { .. } => 6,
        }
    }

    /// Number of bytes announced for this command in the frame header
    ///
    /// Equal to [`encoded_len`](Self::encoded_len) for every variant except
    /// `Text`, which is announced two bytes short.
    pub fn declared_len(&self) -> usize {
        match self {
            GraphicCommand::Text { text, .. } => TEXT_DECLARED_HEADER_LEN + text.len(),
            other => other.encoded_len(),
        }
    }

    /// Append the wire form of this command to `out`
    pub(crate) fn encode_into(&self, out: &mut Vec<u8, MAX_FRAME_SIZE>) -> Result<(), EncodeError> {
        put(out, &[self.id()])?;

        match self {
            GraphicCommand::Text {
                x,
                y,
                rotation,
                font,
                text,
            } => {
                if !text.is_ascii() {
                    return Err(EncodeError::NonAsciiText);
                }
                put(out, &x.to_le_bytes())?;
                put(out, &[*y, *rotation, *font, text.len() as u8])?;
                put(out, text.as_bytes())
            }
            GraphicCommand::Line { x0, y0, x1, y1 } | GraphicCommand::Rect { x0, y0, x1, y1 } => {
                put(out, &x0.to_le_bytes())?;
                put(out, &y0.to_le_bytes())?;
                put(out, &x1.to_le_bytes())?;
                put(out, &y1.to_le_bytes())
            }
            GraphicCommand::Circle { x, y, radius } => {
                put(out, &x.to_le_bytes())?;
                put(out, &y.to_le_bytes())?;
                put(out, &[*radius])
            }
            GraphicCommand::Image { id, x, y } => {
                put(out, &[*id])?;
                put(out, &x.to_le_bytes())?;
                put(out, &y.to_le_bytes())
            }
        }
    }
}

fn put(out: &mut Vec<u8, MAX_FRAME_SIZE>, bytes: &[u8]) -> Result<(), EncodeError> {
    let size = out.len() + bytes.len();
    out.extend_from_slice(bytes)
        .map_err(|_| EncodeError::CapacityExceeded { size })
}
