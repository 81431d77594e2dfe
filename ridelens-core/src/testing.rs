//! Recording mock transports for unit tests

use std::string::String;
use std::vec::Vec;

use crate::traits::{
    Peripheral, Point, SinkTransport, SourceTransport, Stream, SubscriptionId, TransportError,
};

/// A primitive issued to the mock sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    StartScan,
    StopScan,
    Connect(String),
    Disconnect,
    Clear,
    Text {
        pos: Point,
        font: u8,
        text: String,
    },
    Line(Point, Point),
    Image(u8, Point),
    SaveLayout(Vec<u8>),
    DisplayLayout(u8, String),
    DeleteLayout(u8),
}

#[derive(Debug, Default)]
pub struct MockSink {
    pub calls: Vec<SinkCall>,
    pub fail_scan: bool,
    pub fail_connect: bool,
    pub fail_writes: bool,
    pub persistent_layouts: bool,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&SinkCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clears(&self) -> usize {
        self.count(|c| matches!(c, SinkCall::Clear))
    }

    pub fn scans(&self) -> usize {
        self.count(|c| matches!(c, SinkCall::StartScan))
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SinkCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn write(&mut self, call: SinkCall) -> Result<(), TransportError> {
        if self.fail_writes {
            return Err(TransportError::Io);
        }
        self.calls.push(call);
        Ok(())
    }

    fn layout_op(&mut self, call: SinkCall) -> Result<(), TransportError> {
        if !self.persistent_layouts {
            return Err(TransportError::Unsupported);
        }
        self.write(call)
    }
}

impl SinkTransport for MockSink {
    fn start_scan(&mut self) -> Result<(), TransportError> {
        if self.fail_scan {
            return Err(TransportError::Unavailable);
        }
        self.calls.push(SinkCall::StartScan);
        Ok(())
    }

    fn stop_scan(&mut self) {
        self.calls.push(SinkCall::StopScan);
    }

    fn connect(&mut self, peripheral: &Peripheral) -> Result<(), TransportError> {
        if self.fail_connect {
            return Err(TransportError::Rejected);
        }
        self.calls
            .push(SinkCall::Connect(peripheral.address.as_str().into()));
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        self.calls.push(SinkCall::Disconnect);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), TransportError> {
        self.write(SinkCall::Clear)
    }

    fn write_text(
        &mut self,
        pos: Point,
        _rotation: u8,
        font: u8,
        _color: u8,
        text: &str,
    ) -> Result<(), TransportError> {
        self.write(SinkCall::Text {
            pos,
            font,
            text: text.into(),
        })
    }

    fn write_line(&mut self, p0: Point, p1: Point) -> Result<(), TransportError> {
        self.write(SinkCall::Line(p0, p1))
    }

    fn write_image(&mut self, id: u8, pos: Point) -> Result<(), TransportError> {
        self.write(SinkCall::Image(id, pos))
    }

    fn save_layout(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.layout_op(SinkCall::SaveLayout(frame.to_vec()))
    }

    fn display_layout(&mut self, id: u8, value: &str) -> Result<(), TransportError> {
        self.layout_op(SinkCall::DisplayLayout(id, value.into()))
    }

    fn delete_layout(&mut self, id: u8) -> Result<(), TransportError> {
        self.layout_op(SinkCall::DeleteLayout(id))
    }
}

/// A primitive issued to the mock source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Connect,
    Disconnect,
    Subscribe(Stream),
    Unsubscribe(SubscriptionId),
}

#[derive(Debug, Default)]
pub struct MockSource {
    pub calls: Vec<SourceCall>,
    pub fail_connect: bool,
    pub fail_subscribe: Vec<Stream>,
    next_id: u32,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connects(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SourceCall::Connect))
            .count()
    }

    pub fn subscriptions(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, SourceCall::Subscribe(_)))
            .count()
    }
}

impl SourceTransport for MockSource {
    fn connect(&mut self) -> Result<(), TransportError> {
        self.calls.push(SourceCall::Connect);
        if self.fail_connect {
            return Err(TransportError::Unavailable);
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.calls.push(SourceCall::Disconnect);
    }

    fn subscribe(&mut self, stream: Stream) -> Result<SubscriptionId, TransportError> {
        if self.fail_subscribe.contains(&stream) {
            return Err(TransportError::Rejected);
        }
        self.calls.push(SourceCall::Subscribe(stream));
        self.next_id += 1;
        Ok(SubscriptionId(self.next_id))
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.calls.push(SourceCall::Unsubscribe(id));
    }
}

pub fn glasses(address: &str) -> Peripheral {
    Peripheral::new(address, "G1", -60).unwrap()
}
