//! Configuration type definitions

use heapless::{String, Vec};

use crate::metrics::Metric;
use crate::traits::Address;

/// Maximum label length for names and field ids
pub const MAX_LABEL_LEN: usize = 24;

/// Maximum unit length
pub const MAX_UNIT_LEN: usize = 8;

/// Maximum template id length
pub const MAX_TEMPLATE_ID_LEN: usize = 16;

/// Maximum zones (and therefore fields) per profile
pub const MAX_ZONES: usize = 6;

/// Default auto-connect scan window
pub const DEFAULT_AUTO_RECONNECT_TIMEOUT_MS: u32 = 30_000;

/// Default interval of the periodic status log
pub const DEFAULT_STATUS_LOG_INTERVAL_MS: u32 = 30_000;

/// How flushes reach the glasses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderMode {
    /// Every flush redraws through text/line/image primitives
    #[default]
    Direct,
    /// Layouts are saved on the glasses once; flushes only send values
    Persistent,
}

/// Bridge preferences owned by the host application
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeSettings {
    /// Address of the previously paired glasses
    pub last_sink_address: Option<Address>,
    /// Connect to the paired glasses at startup
    pub auto_connect: bool,
    /// How long the startup auto-connect scan may run
    pub auto_reconnect_timeout_ms: u32,
    /// Disconnect the glasses when the ride returns to idle
    pub disconnect_on_idle: bool,
    /// Flush rendering strategy
    pub render_mode: RenderMode,
    /// Interval of the periodic status log
    pub status_log_interval_ms: u32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            last_sink_address: None,
            auto_connect: true,
            auto_reconnect_timeout_ms: DEFAULT_AUTO_RECONNECT_TIMEOUT_MS,
            disconnect_on_idle: false,
            render_mode: RenderMode::Direct,
            status_log_interval_ms: DEFAULT_STATUS_LOG_INTERVAL_MS,
        }
    }
}

/// Display options for one field
///
/// Name, unit and icon come from the external field catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldConfig {
    /// Field id, matched against the metric catalog
    pub field_id: String<MAX_LABEL_LEN>,
    /// Display name
    pub name: String<MAX_LABEL_LEN>,
    /// Display unit
    pub unit: Option<String<MAX_UNIT_LEN>>,
    /// Glasses image asset
    pub icon_id: Option<u8>,
    /// Draw the icon
    pub show_icon: bool,
    /// Draw the label
    pub show_label: bool,
    /// Append the unit to the label
    pub show_unit: bool,
}

impl FieldConfig {
    /// Field showing a catalog metric with its own name, unit and icon
    pub fn from_metric(metric: Metric) -> Self {
        let mut field = Self {
            icon_id: Some(metric.icon_id()),
            show_icon: true,
            show_label: true,
            show_unit: true,
            ..Default::default()
        };
        // Catalog ids and names fit the label bound
        let _ = field.field_id.push_str(metric.id());
        let _ = field.name.push_str(metric.name());
        field.unit = metric.unit().and_then(|u| {
            let mut unit = String::new();
            unit.push_str(u).ok()?;
            Some(unit)
        });
        field
    }

    /// Metric this field shows, if the id is known
    pub fn metric(&self) -> Option<Metric> {
        Metric::from_id(&self.field_id)
    }
}

/// A display profile: a template plus one optional field per zone
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayProfile {
    /// Profile name
    pub name: String<MAX_LABEL_LEN>,
    /// Layout template id (e.g. "4D")
    pub template_id: String<MAX_TEMPLATE_ID_LEN>,
    /// Field per zone, by zone index
    pub fields: Vec<Option<FieldConfig>, MAX_ZONES>,
}

impl DisplayProfile {
    /// Field assigned to a zone, if any
    pub fn field(&self, zone: usize) -> Option<&FieldConfig> {
        self.fields.get(zone).and_then(|f| f.as_ref())
    }
}
