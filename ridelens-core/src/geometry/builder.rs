//! Layout builder
//!
//! Turns a zone (or one of the three legacy full-width sections) plus an
//! optional field configuration into a [`LayoutDescriptor`]. Command
//! coordinates are relative to the clipping region.

use heapless::String;
use ridelens_protocol::{
    ClippingRegion, GraphicCommand, LayoutDescriptor, TextConfig, DISPLAY_WIDTH, MAX_TEXT_LEN,
};

use super::template::LayoutZone;
use crate::config::FieldConfig;

/// Left margin of the icon
pub const ICON_MARGIN: i16 = 10;

/// Icon assets are square
pub const ICON_SIZE: i16 = 24;

/// Gap between icon and label
pub const ICON_LABEL_SPACING: i16 = 8;

/// Left margin of the label when no icon is drawn
pub const LABEL_MARGIN: i16 = 20;

/// Label baseline offset
pub const LABEL_Y: i16 = 15;

/// Font used for labels
pub const LABEL_FONT: u8 = 1;

/// Rotation of text commands stored inside a layout
pub const LABEL_ROTATION: u8 = 0;

/// Upright rotation for directly drawn text and layout values
pub const TEXT_ROTATION: u8 = 4;

/// Value offset inside a legacy section
pub const VALUE_Y: i16 = 45;

/// Height of a legacy section
pub const SECTION_HEIGHT: u8 = 85;

/// Font of a legacy section value
pub const SECTION_FONT: u8 = 2;

pub const FOREGROUND: u8 = 15;
pub const BACKGROUND: u8 = 0;

/// Legacy full-width sections stacked top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Section {
    Top,
    Middle,
    Bottom,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Top, Section::Middle, Section::Bottom];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn clip(self) -> ClippingRegion {
        ClippingRegion::new(
            0,
            SECTION_HEIGHT * self.index(),
            DISPLAY_WIDTH,
            SECTION_HEIGHT,
        )
    }
}

/// Where a layout goes
#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    Zone(&'a LayoutZone),
    Section(Section),
}

impl Slot<'_> {
    pub fn clip(&self) -> ClippingRegion {
        match self {
            Slot::Zone(zone) => zone.clip(),
            Slot::Section(section) => section.clip(),
        }
    }

    pub fn font(&self) -> u8 {
        match self {
            Slot::Zone(zone) => zone.font,
            Slot::Section(_) => SECTION_FONT,
        }
    }

    /// Upper legacy sections get a separator along their bottom edge
    pub fn has_separator(&self) -> bool {
        matches!(self, Slot::Section(Section::Top | Section::Middle))
    }
}

/// Placement of the parts of a field, relative to its area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldGeometry {
    /// Top-left corner of the icon, if one is drawn
    pub icon: Option<(i16, i16)>,
    pub label_x: i16,
    pub label_y: i16,
    pub value_x: i16,
    pub value_y: i16,
}

impl FieldGeometry {
    /// Compute placement for an area of `width` x `height` pixels
    pub fn compute(width: u16, height: u8, show_icon: bool) -> Self {
        let height = height as i16;
        let (icon, label_x) = if show_icon {
            (
                Some((ICON_MARGIN, (height - ICON_SIZE).max(0) / 2)),
                ICON_MARGIN + ICON_SIZE + ICON_LABEL_SPACING,
            )
        } else {
            (None, LABEL_MARGIN)
        };

        Self {
            icon,
            label_x,
            label_y: LABEL_Y,
            value_x: (width / 2) as i16,
            value_y: height * VALUE_Y / SECTION_HEIGHT as i16,
        }
    }
}

/// Label text for a field: uppercased name with an optional unit suffix
pub fn label_text(field: &FieldConfig) -> String<MAX_TEXT_LEN> {
    let mut label = String::new();
    let unit = field.unit.as_deref().filter(|_| field.show_unit);

    let chars = field.name.chars().map(|c| c.to_ascii_uppercase());
    let suffix = unit
        .into_iter()
        .flat_map(|u| " (".chars().chain(u.chars()).chain(")".chars()));

    for c in chars.chain(suffix) {
        let c = if c.is_ascii() { c } else { '?' };
        if label.push(c).is_err() {
            break;
        }
    }
    label
}

/// Build the layout for one slot
///
/// A slot without a field yields a valid descriptor with no commands.
pub fn build(slot: Slot<'_>, layout_id: u8, field: Option<&FieldConfig>) -> LayoutDescriptor {
    let clip = slot.clip();
    let mut layout = LayoutDescriptor::new(layout_id, clip);
    layout.fore_color = FOREGROUND;
    layout.back_color = BACKGROUND;
    layout.font = slot.font();

    let show_icon = field.is_some_and(|f| f.show_icon && f.icon_id.is_some());
    let geometry = FieldGeometry::compute(clip.width, clip.height, show_icon);
    layout.text = TextConfig {
        x: geometry.value_x as u16,
        y: geometry.value_y as u8,
        rotation: TEXT_ROTATION,
        opacity: true,
    };

    let Some(field) = field else {
        return layout;
    };

    // At most three commands, always within MAX_COMMANDS
    if let (Some((x, y)), Some(id)) = (geometry.icon, field.icon_id) {
        let _ = layout.commands.push(GraphicCommand::Image { id, x, y });
    }

    if field.show_label {
        let label = label_text(field);
        if let Some(text) = GraphicCommand::text(
            geometry.label_x,
            geometry.label_y as u8,
            LABEL_ROTATION,
            LABEL_FONT,
            &label,
        ) {
            let _ = layout.commands.push(text);
        }
    }

    if slot.has_separator() {
        let bottom = clip.height as i16 - 1;
        let _ = layout.commands.push(GraphicCommand::Line {
            x0: 0,
            y0: bottom,
            x1: clip.width as i16 - 1,
            y1: bottom,
        });
    }

    layout
}

/// Split an `h:mm:ss` value into the hour part and the `mm:ss` remainder
pub fn split_chrono(value: &str) -> Option<(&str, &str)> {
    let (hours, rest) = value.split_once(':')?;
    if hours.is_empty() || !rest.contains(':') {
        return None;
    }
    Some((hours, rest))
}
