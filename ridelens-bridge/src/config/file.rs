//! TOML file structs and their conversion to core types
//!
//! ```toml
//! [sink]
//! last_address = "AA:BB:CC:DD:EE:FF"
//! auto_connect = true
//! render_mode = "direct"
//!
//! [profile]
//! name = "Road"
//! template = "4D"
//!
//! [[profile.fields]]
//! zone = 0
//! id = "speed"
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use heapless::String as HString;
use serde::Deserialize;

use ridelens_core::config::{
    BridgeSettings, DisplayProfile, FieldConfig, RenderMode, DEFAULT_AUTO_RECONNECT_TIMEOUT_MS,
    DEFAULT_STATUS_LOG_INTERVAL_MS, MAX_ZONES,
};
use ridelens_core::geometry::get_template;
use ridelens_core::metrics::Metric;
use ridelens_core::traits::{Address, ADDRESS_LEN};

use super::{ConfigError, LoadedConfig};

/// Whole settings file
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub sink: SinkSection,
    pub profile: Option<ProfileSection>,
}

/// `[sink]`
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SinkSection {
    pub last_address: Option<String>,
    pub auto_connect: bool,
    pub auto_reconnect_timeout_ms: u32,
    pub disconnect_on_idle: bool,
    pub render_mode: RenderModeName,
    pub status_log_interval_ms: u32,
}

impl Default for SinkSection {
    fn default() -> Self {
        Self {
            last_address: None,
            auto_connect: true,
            auto_reconnect_timeout_ms: DEFAULT_AUTO_RECONNECT_TIMEOUT_MS,
            disconnect_on_idle: false,
            render_mode: RenderModeName::Direct,
            status_log_interval_ms: DEFAULT_STATUS_LOG_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderModeName {
    #[default]
    Direct,
    Persistent,
}

impl From<RenderModeName> for RenderMode {
    fn from(name: RenderModeName) -> Self {
        match name {
            RenderModeName::Direct => RenderMode::Direct,
            RenderModeName::Persistent => RenderMode::Persistent,
        }
    }
}

/// `[profile]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileSection {
    #[serde(default)]
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub fields: Vec<FieldSection>,
}

/// `[[profile.fields]]`
///
/// Name, unit and icon default to the metric catalog entry for `id`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSection {
    pub zone: usize,
    pub id: String,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub icon: Option<u8>,
    #[serde(default = "enabled")]
    pub show_icon: bool,
    #[serde(default = "enabled")]
    pub show_label: bool,
    #[serde(default = "enabled")]
    pub show_unit: bool,
}

fn enabled() -> bool {
    true
}

/// Parse a settings file
pub fn load_settings(input: &str) -> Result<LoadedConfig, ConfigError> {
    let file: SettingsFile = toml::from_str(input).map_err(|_| {
        error!("settings: not a valid settings file");
        ConfigError::Parse
    })?;

    let settings = convert_settings(&file.sink)?;
    let profile = file.profile.as_ref().map(convert_profile).transpose()?;

    info!(
        "settings: loaded, profile {}",
        profile.as_ref().map_or("legacy", |p| p.name.as_str())
    );
    Ok(LoadedConfig { settings, profile })
}

fn bounded<const N: usize>(s: &str) -> Result<HString<N>, ConfigError> {
    let mut out = HString::new();
    out.push_str(s).map_err(|_| ConfigError::LabelTooLong)?;
    Ok(out)
}

fn parse_address(s: &str) -> Result<Address, ConfigError> {
    let valid = s.len() == ADDRESS_LEN
        && s.split(':').count() == 6
        && s
            .split(':')
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ConfigError::InvalidAddress);
    }

    let mut address = Address::new();
    for c in s.chars() {
        address
            .push(c.to_ascii_uppercase())
            .map_err(|_| ConfigError::InvalidAddress)?;
    }
    Ok(address)
}

fn convert_settings(sink: &SinkSection) -> Result<BridgeSettings, ConfigError> {
    Ok(BridgeSettings {
        last_sink_address: sink.last_address.as_deref().map(parse_address).transpose()?,
        auto_connect: sink.auto_connect,
        auto_reconnect_timeout_ms: sink.auto_reconnect_timeout_ms,
        disconnect_on_idle: sink.disconnect_on_idle,
        render_mode: sink.render_mode.into(),
        status_log_interval_ms: sink.status_log_interval_ms,
    })
}

fn convert_field(field: &FieldSection) -> Result<FieldConfig, ConfigError> {
    let metric = Metric::from_id(&field.id);
    if metric.is_none() {
        warn!("settings: unknown field id {}", field.id.as_str());
    }

    let name = match (&field.name, metric) {
        (Some(name), _) => name.as_str(),
        (None, Some(metric)) => metric.name(),
        (None, None) => field.id.as_str(),
    };
    let unit = field
        .unit
        .as_deref()
        .or_else(|| metric.and_then(Metric::unit));

    Ok(FieldConfig {
        field_id: bounded(&field.id)?,
        name: bounded(name)?,
        unit: unit.map(bounded).transpose()?,
        icon_id: field.icon.or_else(|| metric.map(Metric::icon_id)),
        show_icon: field.show_icon,
        show_label: field.show_label,
        show_unit: field.show_unit,
    })
}

fn convert_profile(profile: &ProfileSection) -> Result<DisplayProfile, ConfigError> {
    if profile.fields.len() > MAX_ZONES {
        return Err(ConfigError::TooManyFields);
    }
    let zones = get_template(&profile.template)
        .map_err(|_| ConfigError::Parse)?
        .zones
        .len();

    let mut out = DisplayProfile {
        name: bounded(&profile.name)?,
        template_id: bounded(&profile.template)?,
        fields: heapless::Vec::new(),
    };
    for _ in 0..zones {
        out.fields
            .push(None)
            .map_err(|_| ConfigError::TooManyFields)?;
    }

    for field in &profile.fields {
        let slot = out
            .fields
            .get_mut(field.zone)
            .ok_or(ConfigError::ZoneOutOfRange(field.zone))?;
        if slot.is_some() {
            warn!("settings: zone {} assigned twice", field.zone);
        }
        *slot = Some(convert_field(field)?);
    }

    Ok(out)
}
