//! Display geometry
//!
//! Maps the fixed template catalog and per-field display options to pixel
//! positions and layout descriptors for the 304x256 glasses display.

pub mod builder;
pub mod template;

pub use builder::{build, label_text, split_chrono, FieldGeometry, Section, Slot};
pub use template::{
    get_template, CatalogError, ChronoAnchor, LayoutTemplate, LayoutZone, TemplateCatalog,
    FALLBACK_TEMPLATE_ID,
};
