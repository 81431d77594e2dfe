//! Layout template catalog
//!
//! Seven fixed templates split the display into 1 to 6 zones. The catalog
//! is a read-only static table; lookups of unknown ids fall back to
//! [`FALLBACK_TEMPLATE_ID`].

use core::fmt;

use ridelens_protocol::ClippingRegion;

/// Template used when a profile names an unknown template
pub const FALLBACK_TEMPLATE_ID: &str = "3D_FULL";

/// Where the hour part of a chronometer is drawn, relative to the zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChronoAnchor {
    pub hour_x: i16,
    pub hour_y: i16,
}

/// A named pixel slot of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayoutZone {
    pub id: &'static str,
    pub name: &'static str,
    pub x: u16,
    pub y: u8,
    pub width: u16,
    pub height: u8,
    pub font: u8,
    /// Set for zones that can show a split chronometer
    pub chrono: Option<ChronoAnchor>,
}

impl LayoutZone {
    const fn new(
        id: &'static str,
        name: &'static str,
        x: u16,
        y: u8,
        width: u16,
        height: u8,
        font: u8,
    ) -> Self {
        Self {
            id,
            name,
            x,
            y,
            width,
            height,
            font,
            chrono: None,
        }
    }

    const fn with_chrono(mut self, hour_x: i16, hour_y: i16) -> Self {
        self.chrono = Some(ChronoAnchor { hour_x, hour_y });
        self
    }

    /// Check if this zone carries a chronometer anchor
    pub fn is_chrono(&self) -> bool {
        self.chrono.is_some()
    }

    /// Drawing area of this zone
    pub fn clip(&self) -> ClippingRegion {
        ClippingRegion::new(self.x, self.y, self.width, self.height)
    }
}

/// A display template
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayoutTemplate {
    pub id: &'static str,
    pub zones: &'static [LayoutZone],
    pub max_fields: usize,
}

/// Template catalog errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// The catalog has no fallback template
    MissingFallback,
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::MissingFallback => {
                write!(f, "template catalog lacks {}", FALLBACK_TEMPLATE_ID)
            }
        }
    }
}

const ONE: [LayoutZone; 1] =
    [LayoutZone::new("center", "Center", 0, 0, 304, 255, 3).with_chrono(40, 60)];

const TWO: [LayoutZone; 2] = [
    LayoutZone::new("top", "Top", 0, 0, 304, 128, 3),
    LayoutZone::new("bottom", "Bottom", 0, 128, 304, 127, 3),
];

const THREE_TRIANGLE: [LayoutZone; 3] = [
    LayoutZone::new("top", "Top", 0, 0, 304, 128, 3).with_chrono(30, 40),
    LayoutZone::new("bottom_left", "Bottom Left", 0, 128, 152, 127, 2),
    LayoutZone::new("bottom_right", "Bottom Right", 152, 128, 152, 127, 2),
];

const THREE_FULL: [LayoutZone; 3] = [
    LayoutZone::new("top", "Top", 0, 0, 304, 85, 2),
    LayoutZone::new("middle", "Middle", 0, 85, 304, 85, 2),
    LayoutZone::new("bottom", "Bottom", 0, 170, 304, 85, 2),
];

const FOUR: [LayoutZone; 4] = [
    LayoutZone::new("top_left", "Top Left", 0, 0, 152, 128, 2),
    LayoutZone::new("top_right", "Top Right", 152, 0, 152, 128, 2),
    LayoutZone::new("bottom_left", "Bottom Left", 0, 128, 152, 127, 2),
    LayoutZone::new("bottom_right", "Bottom Right", 152, 128, 152, 127, 2),
];

const FIVE: [LayoutZone; 5] = [
    LayoutZone::new("top", "Top", 0, 0, 304, 85, 2).with_chrono(30, 30),
    LayoutZone::new("middle_left", "Middle Left", 0, 85, 152, 85, 1),
    LayoutZone::new("middle_right", "Middle Right", 152, 85, 152, 85, 1),
    LayoutZone::new("bottom_left", "Bottom Left", 0, 170, 152, 85, 1),
    LayoutZone::new("bottom_right", "Bottom Right", 152, 170, 152, 85, 1),
];

const SIX: [LayoutZone; 6] = [
    LayoutZone::new("top_left", "Top Left", 0, 0, 152, 85, 1),
    LayoutZone::new("top_right", "Top Right", 152, 0, 152, 85, 1),
    LayoutZone::new("middle_left", "Middle Left", 0, 85, 152, 85, 1),
    LayoutZone::new("middle_right", "Middle Right", 152, 85, 152, 85, 1),
    LayoutZone::new("bottom_left", "Bottom Left", 0, 170, 152, 85, 1),
    LayoutZone::new("bottom_right", "Bottom Right", 152, 170, 152, 85, 1),
];

static BUILTIN: [LayoutTemplate; 7] = [
    LayoutTemplate {
        id: "1D",
        zones: &ONE,
        max_fields: 1,
    },
    LayoutTemplate {
        id: "2D",
        zones: &TWO,
        max_fields: 2,
    },
    LayoutTemplate {
        id: "3D_TRIANGLE",
        zones: &THREE_TRIANGLE,
        max_fields: 3,
    },
    LayoutTemplate {
        id: FALLBACK_TEMPLATE_ID,
        zones: &THREE_FULL,
        max_fields: 3,
    },
    LayoutTemplate {
        id: "4D",
        zones: &FOUR,
        max_fields: 4,
    },
    LayoutTemplate {
        id: "5D",
        zones: &FIVE,
        max_fields: 5,
    },
    LayoutTemplate {
        id: "6D",
        zones: &SIX,
        max_fields: 6,
    },
];

/// Read-only view over a set of templates
#[derive(Debug, Clone, Copy)]
pub struct TemplateCatalog<'a> {
    templates: &'a [LayoutTemplate],
}

impl TemplateCatalog<'static> {
    /// The built-in catalog
    pub fn builtin() -> Self {
        Self { templates: &BUILTIN }
    }
}

impl<'a> TemplateCatalog<'a> {
    pub fn new(templates: &'a [LayoutTemplate]) -> Self {
        Self { templates }
    }

    /// Look up a template, falling back to [`FALLBACK_TEMPLATE_ID`]
    pub fn get(&self, id: &str) -> Result<&'a LayoutTemplate, CatalogError> {
        if let Some(template) = self.find(id) {
            return Ok(template);
        }
        warn!("unknown template {}, using {}", id, FALLBACK_TEMPLATE_ID);
        self.find(FALLBACK_TEMPLATE_ID)
            .ok_or(CatalogError::MissingFallback)
    }

    fn find(&self, id: &str) -> Option<&'a LayoutTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a LayoutTemplate> {
        self.templates.iter()
    }
}

/// Look up a template in the built-in catalog
pub fn get_template(id: &str) -> Result<&'static LayoutTemplate, CatalogError> {
    TemplateCatalog::builtin().get(id)
}
