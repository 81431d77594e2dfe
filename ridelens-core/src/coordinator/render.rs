//! Flush rendering
//!
//! Draws the snapshot on the glasses, either through the active profile's
//! template or through the legacy fallback layouts.

use ridelens_protocol::LayoutDescriptor;

use crate::adapter::SinkAdapter;
use crate::config::{DisplayProfile, FieldConfig, RenderMode};
use crate::geometry::{build, get_template, split_chrono, LayoutTemplate, Section, Slot};
use crate::metrics::{Metric, NO_VALUE, UNKNOWN_VALUE};
use crate::snapshot::Snapshot;
use crate::traits::{Point, SinkTransport};

/// Metrics of the direct 2x2 fallback grid, in template "4D" zone order
pub const LEGACY_GRID: [Metric; 4] = [
    Metric::Speed,
    Metric::HeartRate,
    Metric::Cadence,
    Metric::Power,
];

/// Metrics of the stored fallback sections, top to bottom
pub const LEGACY_SECTIONS: [Metric; 3] = [Metric::Speed, Metric::HeartRate, Metric::Power];

const GRID_TEMPLATE: &str = "4D";

/// Value shown for a field
pub fn field_value<'a>(snapshot: &'a Snapshot, field: &FieldConfig) -> &'a str {
    match field.metric() {
        Some(metric) => snapshot.value(metric).unwrap_or(NO_VALUE),
        None => {
            warn!("no metric for field {}", field.field_id.as_str());
            UNKNOWN_VALUE
        }
    }
}

fn profile_template(profile: &DisplayProfile) -> Option<&'static LayoutTemplate> {
    get_template(&profile.template_id)
        .inspect_err(|e| error!("template lookup failed: {:?}", e))
        .ok()
}

/// Layout for every zone of a profile, with layout ids starting at 1
pub fn profile_layouts(profile: &DisplayProfile) -> impl Iterator<Item = LayoutDescriptor> + '_ {
    profile_template(profile)
        .into_iter()
        .flat_map(|template| template.zones.iter().enumerate())
        .map(move |(i, zone)| build(Slot::Zone(zone), i as u8 + 1, profile.field(i)))
}

/// Stored fallback layouts
pub fn legacy_layouts() -> impl Iterator<Item = (LayoutDescriptor, Metric)> {
    Section::ALL
        .into_iter()
        .zip(LEGACY_SECTIONS)
        .map(|(section, metric)| {
            let field = FieldConfig::from_metric(metric);
            let layout = build(Slot::Section(section), section.index() + 1, Some(&field));
            (layout, metric)
        })
}

/// Number of glasses layout slots used by a profile
pub fn layout_count(profile: Option<&DisplayProfile>) -> usize {
    match profile {
        Some(profile) => profile_template(profile).map_or(0, |t| t.zones.len()),
        None => LEGACY_SECTIONS.len(),
    }
}

/// Store the layouts for `profile` on the glasses
pub fn upload_layouts<T: SinkTransport>(sink: &mut SinkAdapter<T>, profile: Option<&DisplayProfile>) {
    match profile {
        Some(profile) => {
            for layout in profile_layouts(profile) {
                let _ = sink.upload_layout(&layout);
            }
        }
        None => {
            for (layout, _) in legacy_layouts() {
                let _ = sink.upload_layout(&layout);
            }
        }
    }
}

/// Remove the layouts stored for `profile`
pub fn delete_layouts<T: SinkTransport>(sink: &mut SinkAdapter<T>, profile: Option<&DisplayProfile>) {
    for id in 1..=layout_count(profile) {
        sink.remove_layout(id as u8);
    }
}

/// Render the snapshot
pub fn render<T: SinkTransport>(
    sink: &mut SinkAdapter<T>,
    mode: RenderMode,
    profile: Option<&DisplayProfile>,
    snapshot: &Snapshot,
) {
    match (mode, profile) {
        (RenderMode::Direct, Some(profile)) => render_profile_direct(sink, profile, snapshot),
        (RenderMode::Persistent, Some(profile)) => {
            render_profile_stored(sink, profile, snapshot)
        }
        (RenderMode::Direct, None) => render_legacy_grid(sink, snapshot),
        (RenderMode::Persistent, None) => render_legacy_stored(sink, snapshot),
    }
}

fn render_profile_direct<T: SinkTransport>(
    sink: &mut SinkAdapter<T>,
    profile: &DisplayProfile,
    snapshot: &Snapshot,
) {
    sink.clear_display();
    let Some(template) = profile_template(profile) else {
        return;
    };

    for (i, zone) in template.zones.iter().enumerate() {
        let field = profile.field(i);
        let layout = build(Slot::Zone(zone), i as u8 + 1, field);
        let Some(field) = field else {
            sink.render_layout(&layout, "");
            continue;
        };

        let value = field_value(snapshot, field);
        let chrono = zone
            .chrono
            .filter(|_| field.metric().is_some_and(Metric::is_duration))
            .and_then(|anchor| split_chrono(value).map(|parts| (anchor, parts)));

        match chrono {
            Some((anchor, (hours, rest))) => {
                sink.render_layout(&layout, rest);
                let pos = Point::new(
                    zone.x as i16 + anchor.hour_x,
                    zone.y as i16 + anchor.hour_y,
                );
                sink.write_text(pos, zone.font, hours);
            }
            None => sink.render_layout(&layout, value),
        }
    }
}

fn render_profile_stored<T: SinkTransport>(
    sink: &mut SinkAdapter<T>,
    profile: &DisplayProfile,
    snapshot: &Snapshot,
) {
    let Some(template) = profile_template(profile) else {
        return;
    };
    for i in 0..template.zones.len() {
        let value = profile.field(i).map_or("", |f| field_value(snapshot, f));
        sink.show_layout(i as u8 + 1, value);
    }
}

fn render_legacy_grid<T: SinkTransport>(sink: &mut SinkAdapter<T>, snapshot: &Snapshot) {
    sink.clear_display();
    let Ok(grid) = get_template(GRID_TEMPLATE) else {
        return;
    };
    for (zone, metric) in grid.zones.iter().zip(LEGACY_GRID) {
        let field = FieldConfig::from_metric(metric);
        let value = snapshot.value(metric).unwrap_or(NO_VALUE);
        sink.write_field(zone.clip(), zone.font, &field, value, false);
    }
}

fn render_legacy_stored<T: SinkTransport>(sink: &mut SinkAdapter<T>, snapshot: &Snapshot) {
    for (section, metric) in Section::ALL.into_iter().zip(LEGACY_SECTIONS) {
        let value = snapshot.value(metric).unwrap_or(NO_VALUE);
        sink.show_layout(section.index() + 1, value);
    }
}
