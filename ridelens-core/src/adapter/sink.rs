//! Glasses adapter
//!
//! `Disconnected -> Scanning -> Connecting -> Connected`, back to
//! `Disconnected` on link loss and to `Error` when a scan or connect is
//! refused. Writes are fire-and-forget.

use heapless::Vec;
use ridelens_protocol::{ClippingRegion, EncodeError, GraphicCommand, LayoutDescriptor};

use crate::config::FieldConfig;
use crate::geometry::builder::{FieldGeometry, FOREGROUND, LABEL_FONT, TEXT_ROTATION};
use crate::geometry::label_text;
use crate::state::ConnectionState;
use crate::traits::{Peripheral, Point, SinkTransport, TransportError};

/// Maximum peripherals remembered during one scan
pub const MAX_DISCOVERED: usize = 16;

/// State machine around a [`SinkTransport`]
pub struct SinkAdapter<T> {
    transport: T,
    state: ConnectionState<Peripheral>,
    discovered: Vec<Peripheral, MAX_DISCOVERED>,
}

impl<T: SinkTransport> SinkAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            discovered: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState<Peripheral> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Connected peripheral
    pub fn peripheral(&self) -> Option<&Peripheral> {
        self.state.peer()
    }

    /// Peripherals seen during the current scan, by first appearance
    pub fn discovered(&self) -> &[Peripheral] {
        &self.discovered
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn set_state(&mut self, state: ConnectionState<Peripheral>) {
        if self.state != state {
            debug!("sink: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Start scanning; returns false if the transport refused
    pub fn start_scan(&mut self) -> bool {
        if self.is_connected() {
            debug!("sink: already connected, not scanning");
            return false;
        }
        self.discovered.clear();
        match self.transport.start_scan() {
            Ok(()) => {
                self.set_state(ConnectionState::Scanning);
                true
            }
            Err(e) => {
                warn!("sink: scan failed: {:?}", e);
                self.set_state(ConnectionState::error("scan failed"));
                false
            }
        }
    }

    /// Stop an ongoing scan
    pub fn stop_scan(&mut self) {
        if matches!(self.state, ConnectionState::Scanning) {
            self.transport.stop_scan();
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Record a discovery result
    ///
    /// Returns true the first time an address is seen during a scan.
    pub fn on_discovered(&mut self, peripheral: Peripheral) -> bool {
        if !matches!(self.state, ConnectionState::Scanning) {
            return false;
        }
        if self
            .discovered
            .iter()
            .any(|p| p.address == peripheral.address)
        {
            return false;
        }
        debug!("sink: discovered {}", peripheral.address.as_str());
        if self.discovered.push(peripheral).is_err() {
            debug!("sink: discovery list full");
            return false;
        }
        true
    }

    /// Initiate a connection, stopping any scan first
    pub fn connect(&mut self, peripheral: &Peripheral) {
        if matches!(self.state, ConnectionState::Scanning) {
            self.transport.stop_scan();
        }
        info!("sink: connecting to {}", peripheral.address.as_str());
        match self.transport.connect(peripheral) {
            Ok(()) => self.set_state(ConnectionState::Connecting),
            Err(e) => {
                warn!("sink: connect failed: {:?}", e);
                self.set_state(ConnectionState::error("connect failed"));
            }
        }
    }

    pub fn on_connected(&mut self, peripheral: Peripheral) {
        info!("sink: connected to {}", peripheral.address.as_str());
        self.set_state(ConnectionState::Connected(peripheral));
    }

    pub fn on_connect_failed(&mut self) {
        warn!("sink: connection attempt failed");
        self.set_state(ConnectionState::error("connect failed"));
    }

    pub fn on_link_lost(&mut self) {
        if !matches!(self.state, ConnectionState::Disconnected) {
            info!("sink: link lost");
        }
        self.set_state(ConnectionState::Disconnected);
    }

    /// Drop the connection or cancel a pending one
    pub fn disconnect(&mut self) {
        match self.state {
            ConnectionState::Scanning => self.transport.stop_scan(),
            ConnectionState::Connected(_) | ConnectionState::Connecting => {
                if let Err(e) = self.transport.disconnect() {
                    warn!("sink: disconnect failed: {:?}", e);
                }
            }
            _ => {}
        }
        self.set_state(ConnectionState::Disconnected);
    }

    fn writable(&self, op: &str) -> bool {
        if !self.is_connected() {
            debug!("sink: {} skipped, not connected", op);
        }
        self.is_connected()
    }

    fn report(op: &str, result: Result<(), TransportError>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("sink: {} failed: {:?}", op, e);
                false
            }
        }
    }

    pub fn clear_display(&mut self) {
        if self.writable("clear") {
            Self::report("clear", self.transport.clear());
        }
    }

    /// Draw upright foreground text
    pub fn write_text(&mut self, pos: Point, font: u8, text: &str) {
        if self.writable("text") {
            let result = self
                .transport
                .write_text(pos, TEXT_ROTATION, font, FOREGROUND, text);
            Self::report("text", result);
        }
    }

    fn write_line(&mut self, p0: Point, p1: Point) {
        if self.writable("line") {
            Self::report("line", self.transport.write_line(p0, p1));
        }
    }

    fn write_image(&mut self, id: u8, pos: Point) {
        if self.writable("image") {
            Self::report("image", self.transport.write_image(id, pos));
        }
    }

    /// Draw a complete field (icon, label, value, optional separator) in `area`
    pub fn write_field(
        &mut self,
        area: ClippingRegion,
        font: u8,
        field: &FieldConfig,
        value: &str,
        separator: bool,
    ) {
        let show_icon = field.show_icon && field.icon_id.is_some();
        let geometry = FieldGeometry::compute(area.width, area.height, show_icon);
        let ox = area.x as i16;
        let oy = area.y as i16;

        if let (Some((x, y)), Some(id)) = (geometry.icon, field.icon_id) {
            self.write_image(id, Point::new(ox + x, oy + y));
        }
        if field.show_label {
            let label = label_text(field);
            self.write_text(
                Point::new(ox + geometry.label_x, oy + geometry.label_y),
                LABEL_FONT,
                &label,
            );
        }
        self.write_text(
            Point::new(ox + geometry.value_x, oy + geometry.value_y),
            font,
            value,
        );
        if separator {
            let y = oy + area.height as i16 - 1;
            self.write_line(Point::new(ox, y), Point::new(ox + area.width as i16 - 1, y));
        }
    }

    /// Draw a layout through the direct primitives, with `value` as its text
    pub fn render_layout(&mut self, layout: &LayoutDescriptor, value: &str) {
        let ox = layout.clip.x as i16;
        let oy = layout.clip.y as i16;
        let at = |x: i16, y: i16| Point::new(ox + x, oy + y);

        for command in &layout.commands {
            match command {
                GraphicCommand::Text {
                    x, y, font, text, ..
                } => self.write_text(at(*x, *y as i16), *font, text),
                GraphicCommand::Line { x0, y0, x1, y1 } => {
                    self.write_line(at(*x0, *y0), at(*x1, *y1))
                }
                GraphicCommand::Rect { x0, y0, x1, y1 } => {
                    self.write_line(at(*x0, *y0), at(*x1, *y0));
                    self.write_line(at(*x1, *y0), at(*x1, *y1));
                    self.write_line(at(*x1, *y1), at(*x0, *y1));
                    self.write_line(at(*x0, *y1), at(*x0, *y0));
                }
                GraphicCommand::Image { id, x, y } => self.write_image(*id, at(*x, *y)),
                GraphicCommand::Circle { .. } => debug!("sink: circle has no direct primitive"),
            }
        }

        self.write_text(
            at(layout.text.x as i16, layout.text.y as i16),
            layout.font,
            value,
        );
    }

    /// Encode a layout and store it on the glasses
    ///
    /// Encoding errors are returned; transport errors are only logged.
    pub fn upload_layout(&mut self, layout: &LayoutDescriptor) -> Result<(), EncodeError> {
        let frame = layout.encode().inspect_err(|e| {
            error!("sink: layout {} does not encode: {:?}", layout.layout_id, e);
        })?;
        if self.writable("save layout") {
            Self::report("save layout", self.transport.save_layout(&frame));
        }
        Ok(())
    }

    /// Show a stored layout with a value
    pub fn show_layout(&mut self, id: u8, value: &str) {
        if self.writable("display layout") {
            Self::report("display layout", self.transport.display_layout(id, value));
        }
    }

    /// Remove a stored layout
    pub fn remove_layout(&mut self, id: u8) {
        if self.writable("delete layout") {
            Self::report("delete layout", self.transport.delete_layout(id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{build, Section, Slot};
    use crate::metrics::Metric;
    use crate::testing::{glasses, MockSink, SinkCall};

    fn connected() -> SinkAdapter<MockSink> {
        let mut sink = SinkAdapter::new(MockSink::new());
        sink.on_connected(glasses("AA:BB:CC:DD:EE:01"));
        sink
    }

    #[test]
    fn test_scan_connect_flow() {
        let mut sink = SinkAdapter::new(MockSink::new());
        assert!(sink.start_scan());
        assert_eq!(sink.state(), &ConnectionState::Scanning);

        let g = glasses("AA:BB:CC:DD:EE:01");
        assert!(sink.on_discovered(g.clone()));
        sink.connect(&g);
        assert_eq!(sink.state(), &ConnectionState::Connecting);
        assert!(sink.transport().calls.contains(&SinkCall::StopScan));

        sink.on_connected(g.clone());
        assert_eq!(sink.peripheral(), Some(&g));

        sink.on_link_lost();
        assert_eq!(sink.state(), &ConnectionState::Disconnected);
    }

    #[test]
    fn test_discovery_deduplicated() {
        let mut sink = SinkAdapter::new(MockSink::new());
        sink.start_scan();
        assert!(sink.on_discovered(glasses("AA:BB:CC:DD:EE:01")));
        assert!(!sink.on_discovered(glasses("AA:BB:CC:DD:EE:01")));
        assert!(sink.on_discovered(glasses("AA:BB:CC:DD:EE:02")));
        assert_eq!(sink.discovered().len(), 2);
    }

    #[test]
    fn test_discovery_ignored_when_not_scanning() {
        let mut sink = SinkAdapter::new(MockSink::new());
        assert!(!sink.on_discovered(glasses("AA:BB:CC:DD:EE:01")));
    }

    #[test]
    fn test_scan_failure_is_error() {
        let mut transport = MockSink::new();
        transport.fail_scan = true;
        let mut sink = SinkAdapter::new(transport);
        assert!(!sink.start_scan());
        assert!(sink.state().is_error());
    }

    #[test]
    fn test_connect_failure_is_error() {
        let mut transport = MockSink::new();
        transport.fail_connect = true;
        let mut sink = SinkAdapter::new(transport);
        sink.connect(&glasses("AA:BB:CC:DD:EE:01"));
        assert!(sink.state().is_error());

        let mut sink = SinkAdapter::new(MockSink::new());
        sink.connect(&glasses("AA:BB:CC:DD:EE:01"));
        sink.on_connect_failed();
        assert!(sink.state().is_error());
    }

    #[test]
    fn test_writes_skipped_when_disconnected() {
        let mut sink = SinkAdapter::new(MockSink::new());
        sink.clear_display();
        sink.write_text(Point::new(0, 0), 2, "x");
        assert!(sink.transport().calls.is_empty());
    }

    #[test]
    fn test_write_errors_are_swallowed() {
        let mut sink = connected();
        sink.transport_mut().fail_writes = true;
        sink.clear_display();
        sink.write_text(Point::new(0, 0), 2, "x");
        assert!(sink.is_connected());
    }

    #[test]
    fn test_write_field_positions() {
        let mut sink = connected();
        let field = FieldConfig::from_metric(Metric::Speed);
        let area = ClippingRegion::new(152, 128, 152, 127);
        sink.write_field(area, 2, &field, "25.2", false);

        let calls = &sink.transport().calls;
        assert_eq!(calls[0], SinkCall::Image(12, Point::new(162, 128 + 51)));
        assert_eq!(
            calls[1],
            SinkCall::Text {
                pos: Point::new(152 + 42, 128 + 15),
                font: 1,
                text: "SPEED (km/h)".into()
            }
        );
        assert_eq!(
            calls[2],
            SinkCall::Text {
                pos: Point::new(152 + 76, 128 + 67),
                font: 2,
                text: "25.2".into()
            }
        );
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn test_render_layout_offsets_by_clip() {
        let mut sink = connected();
        let field = FieldConfig::from_metric(Metric::Power);
        let layout = build(Slot::Section(Section::Middle), 2, Some(&field));
        sink.render_layout(&layout, "250");

        let calls = &sink.transport().calls;
        assert_eq!(calls[0], SinkCall::Image(18, Point::new(10, 85 + 30)));
        assert_eq!(
            calls[2],
            SinkCall::Line(Point::new(0, 85 + 84), Point::new(303, 85 + 84))
        );
        assert_eq!(
            calls[3],
            SinkCall::Text {
                pos: Point::new(152, 85 + 45),
                font: 2,
                text: "250".into()
            }
        );
    }

    #[test]
    fn test_upload_layout() {
        let mut sink = connected();
        sink.transport_mut().persistent_layouts = true;
        let layout = build(Slot::Section(Section::Top), 1, None);
        assert!(sink.upload_layout(&layout).is_ok());
        assert!(matches!(
            sink.transport().calls[0],
            SinkCall::SaveLayout(ref frame) if frame.len() == 17 && frame[0] == 1
        ));

        let mut bad = layout.clone();
        bad.layout_id = 0;
        assert_eq!(sink.upload_layout(&bad), Err(EncodeError::InvalidLayoutId(0)));
    }

    #[test]
    fn test_disconnect() {
        let mut sink = connected();
        sink.disconnect();
        assert_eq!(sink.state(), &ConnectionState::Disconnected);
        assert_eq!(sink.transport().calls, vec![SinkCall::Disconnect]);
    }
}
