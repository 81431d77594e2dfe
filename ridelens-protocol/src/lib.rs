//! Glasses layout wire format
//!
//! This crate serializes declarative display layouts into the byte frames
//! understood by the smart-glasses firmware. A layout is stored by the
//! glasses in a numbered memory slot and re-drawn with a fresh value on
//! every update.
//!
//! # Frame Overview
//!
//! Every frame is a fixed 17-byte header followed by the graphic commands
//! of the layout. Multi-byte fields are little-endian.
//! ```text
//! ┌─────────┬──────────┬──────────────┬────────────┬──────────────┐
//! │ LAYOUT  │ CMD SIZE │ CLIP REGION  │ COLORS/FONT│ TEXT CONFIG  │ COMMANDS...
//! │ 1B      │ 1B       │ 6B           │ 3B         │ 6B           │ 0–109B
//! └─────────┴──────────┴──────────────┴────────────┴──────────────┘
//! ```
//!
//! A complete frame never exceeds [`MAX_FRAME_SIZE`] bytes.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod layout;

pub use command::{GraphicCommand, MAX_TEXT_LEN};
pub use layout::{
    encode_layouts, ClippingRegion, EncodeError, Frame, LayoutDescriptor, TextConfig,
    HEADER_SIZE, MAX_COMMANDS, MAX_FRAME_SIZE,
};

/// Display width in pixels
pub const DISPLAY_WIDTH: u16 = 304;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u16 = 256;
