//! Bridge coordinator
//!
//! The coordinator is the central brain that:
//! - Owns both adapters, the snapshot and the active display profile
//! - Derives the bridge state from the two connection states
//! - Throttles glasses updates with the hold/flush timer
//! - Runs the startup auto-connect and the in-session reconnect policies
//! - Feeds the simulator into the snapshot
//!
//! It is a synchronous state machine: callers feed it events with
//! [`Coordinator::handle`], call [`Coordinator::poll`] when
//! [`Coordinator::next_deadline`] passes, and never touch its state from
//! another context.

pub mod render;
pub mod simulator;
pub mod timers;

use crate::adapter::{SinkAdapter, SourceAdapter};
use crate::config::{BridgeSettings, DisplayProfile, RenderMode};
use crate::metrics::RideState;
use crate::snapshot::Snapshot;
use crate::state::{BridgeState, BridgeStatus, Event};
use crate::traits::{Address, Peripheral, SinkTransport, SourceDevice, SourceTransport};

use simulator::RideSimulator;
use timers::{OneShotTimer, PeriodicTimer};

/// Hold/flush period and minimum gap between flushes
pub const FLUSH_INTERVAL_MS: u32 = 1_000;

/// Period of the in-session glasses reconnect task
pub const SESSION_RECONNECT_INTERVAL_MS: u32 = 15_000;

/// Scan window of one in-session reconnect attempt
pub const SESSION_SCAN_WINDOW_MS: u32 = 10_000;

/// How long a manual scan waits for a peripheral
pub const MANUAL_SCAN_TIMEOUT_MS: u32 = 30_000;

/// Period of the simulator
pub const SIMULATOR_INTERVAL_MS: u32 = 2_000;

/// Which peripheral a scan session connects to
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanTarget {
    /// A known address only
    Targeted(Address),
    /// Whatever shows up first
    FirstFound,
}

#[derive(Debug, Clone)]
struct ScanSession {
    target: ScanTarget,
    /// Set once a matching peripheral was picked; the timeout re-checks it
    found: bool,
}

impl ScanSession {
    fn matches(&self, peripheral: &Peripheral) -> bool {
        match &self.target {
            ScanTarget::Targeted(address) => peripheral.address == *address,
            ScanTarget::FirstFound => true,
        }
    }
}

/// The bridge coordinator
pub struct Coordinator<S, T> {
    source: SourceAdapter<S>,
    sink: SinkAdapter<T>,
    settings: BridgeSettings,
    profile: Option<DisplayProfile>,
    snapshot: Snapshot,
    ride: RideState,
    bridge: BridgeState,
    streaming: bool,
    simulating: bool,
    simulator: RideSimulator,
    scan: Option<ScanSession>,
    flush_timer: PeriodicTimer,
    reconnect_timer: PeriodicTimer,
    scan_timeout: OneShotTimer,
    status_timer: PeriodicTimer,
    sim_timer: PeriodicTimer,
    paired: Option<Address>,
    last_status: Option<BridgeStatus>,
    shut_down: bool,
}

impl<S: SourceTransport, T: SinkTransport> Coordinator<S, T> {
    /// Create a coordinator around the two transports
    pub fn new(
        source: S,
        sink: T,
        settings: BridgeSettings,
        profile: Option<DisplayProfile>,
    ) -> Self {
        let status_period = settings.status_log_interval_ms;
        Self {
            source: SourceAdapter::new(source),
            sink: SinkAdapter::new(sink),
            settings,
            profile,
            snapshot: Snapshot::new(),
            ride: RideState::Idle,
            bridge: BridgeState::Idle,
            streaming: false,
            simulating: false,
            simulator: RideSimulator::new(),
            scan: None,
            flush_timer: PeriodicTimer::new(FLUSH_INTERVAL_MS),
            reconnect_timer: PeriodicTimer::new(SESSION_RECONNECT_INTERVAL_MS),
            scan_timeout: OneShotTimer::new(),
            status_timer: PeriodicTimer::new(status_period),
            sim_timer: PeriodicTimer::new(SIMULATOR_INTERVAL_MS),
            paired: None,
            last_status: None,
            shut_down: false,
        }
    }

    /// Connect the ride computer and, if configured, the paired glasses
    pub fn start(&mut self, now_ms: u64) {
        info!("coordinator: starting");
        self.source.connect();

        if self.settings.auto_connect {
            if let Some(address) = self.settings.last_sink_address.clone() {
                info!("coordinator: auto-connecting to {}", address.as_str());
                let timeout = self.settings.auto_reconnect_timeout_ms;
                self.start_scan(ScanTarget::Targeted(address), now_ms, timeout);
            }
        }

        if self.settings.status_log_interval_ms > 0 {
            self.status_timer.start(now_ms);
        }
        self.refresh(now_ms);
    }

    /// Process one event
    pub fn handle(&mut self, event: Event, now_ms: u64) {
        if self.shut_down {
            debug!("coordinator: event after shutdown ignored");
            return;
        }

        match event {
            Event::SourceConnected(device) => self.on_source_connected(device),
            Event::SourceConnectFailed => self.source.on_connect_failed(now_ms),
            Event::SourceDisconnected => self.source.on_disconnected(now_ms),
            Event::SubscriptionError(stream) => self.source.on_subscription_error(stream),
            Event::MetricSample(metric, raw) => self.snapshot.update(metric, raw),
            Event::RideStateChanged(state) => self.on_ride_state(state, now_ms),

            Event::SinkDiscovered(peripheral) => self.on_discovered(peripheral),
            Event::SinkConnected(peripheral) => self.on_sink_connected(peripheral),
            Event::SinkConnectFailed => {
                self.end_scan();
                self.sink.on_connect_failed();
            }
            Event::SinkDisconnected => {
                self.end_scan();
                self.sink.on_link_lost();
            }

            Event::ConnectSource => self.source.connect(),
            Event::ReconnectSource => self.source.reconnect(),
            Event::DisconnectSource => self.source.disconnect(),
            Event::StartManualScan => {
                self.start_scan(ScanTarget::FirstFound, now_ms, MANUAL_SCAN_TIMEOUT_MS)
            }
            Event::StopScan => {
                self.end_scan();
                self.sink.stop_scan();
            }
            Event::ConnectSink(peripheral) => {
                self.end_scan();
                self.sink.connect(&peripheral);
            }
            Event::DisconnectSink => {
                self.end_scan();
                self.sink.disconnect();
            }
            Event::StartStreaming => self.start_streaming(),
            Event::StopStreaming => self.stop_streaming(),
            Event::SetSimulation(enabled) => self.set_simulation(enabled, now_ms),
            Event::ApplyProfile(profile) => self.apply_profile(profile),
            Event::Shutdown => {
                self.shutdown();
                return;
            }
        }

        self.refresh(now_ms);
    }

    /// Fire every due timer
    pub fn poll(&mut self, now_ms: u64) {
        if self.shut_down {
            return;
        }

        self.source.poll(now_ms);

        if self.scan_timeout.fire(now_ms) {
            self.on_scan_timeout();
        }
        if self.reconnect_timer.fire(now_ms) {
            self.session_reconnect(now_ms);
        }
        if self.sim_timer.fire(now_ms) {
            for (metric, raw) in self.simulator.next_samples() {
                self.snapshot.update(metric, raw);
            }
        }
        if self.flush_timer.fire(now_ms) {
            self.try_flush(now_ms);
        }
        if self.status_timer.fire(now_ms) {
            self.log_status();
        }

        self.refresh(now_ms);
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.flush_timer.deadline(),
            self.reconnect_timer.deadline(),
            self.scan_timeout.deadline(),
            self.status_timer.deadline(),
            self.sim_timer.deadline(),
            self.source.next_deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Cancel every timer and disconnect both sides
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        info!("coordinator: shutting down");
        self.flush_timer.stop();
        self.reconnect_timer.stop();
        self.scan_timeout.cancel();
        self.status_timer.stop();
        self.sim_timer.stop();
        self.scan = None;
        self.streaming = false;
        self.simulating = false;
        self.sink.disconnect();
        self.source.disconnect();
        self.bridge = BridgeState::derive(self.source.state(), self.sink.state(), false);
        self.shut_down = true;
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Current observable status
    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            bridge: self.bridge.clone(),
            source: self.source.state().clone(),
            sink: self.sink.state().clone(),
            ride: self.ride,
            simulating: self.simulating,
        }
    }

    /// Status, if it changed since the last call
    pub fn take_status_change(&mut self) -> Option<BridgeStatus> {
        let status = self.status();
        if self.last_status.as_ref() == Some(&status) {
            return None;
        }
        self.last_status = Some(status.clone());
        Some(status)
    }

    /// Address of newly paired glasses, for the host to persist
    pub fn take_paired_address(&mut self) -> Option<Address> {
        self.paired.take()
    }

    pub fn bridge_state(&self) -> &BridgeState {
        &self.bridge
    }

    pub fn ride_state(&self) -> RideState {
        self.ride
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn profile(&self) -> Option<&DisplayProfile> {
        self.profile.as_ref()
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn source(&self) -> &SourceAdapter<S> {
        &self.source
    }

    pub fn sink(&self) -> &SinkAdapter<T> {
        &self.sink
    }

    fn both_connected(&self) -> bool {
        self.source.is_connected() && self.sink.is_connected()
    }

    /// Recompute derived state after anything changed
    fn refresh(&mut self, now_ms: u64) {
        if self.streaming && !self.both_connected() {
            info!("coordinator: streaming stopped, link lost");
            self.streaming = false;
        }

        let flush_wanted = self.streaming || (self.simulating && self.sink.is_connected());
        if flush_wanted {
            self.flush_timer.ensure_running(now_ms);
        } else {
            self.flush_timer.stop();
        }

        let bridge = BridgeState::derive(self.source.state(), self.sink.state(), self.streaming);
        if bridge != self.bridge {
            info!("bridge: {:?} -> {:?}", self.bridge, bridge);
            self.bridge = bridge;
        }
    }

    fn on_source_connected(&mut self, device: SourceDevice) {
        self.source.on_connected(device);
        if self.ride == RideState::Recording {
            self.start_streaming();
        }
    }

    fn on_ride_state(&mut self, state: RideState, now_ms: u64) {
        if state == self.ride {
            return;
        }
        info!("ride: {:?} -> {:?}", self.ride, state);
        self.ride = state;

        if state == RideState::Recording {
            self.reconnect_timer.start(now_ms);
            self.start_streaming();
            return;
        }

        self.reconnect_timer.stop();
        self.stop_streaming();

        if state == RideState::Idle && self.settings.disconnect_on_idle {
            info!("coordinator: ride idle, disconnecting glasses");
            self.end_scan();
            self.sink.disconnect();
        }
    }

    fn start_streaming(&mut self) {
        if self.streaming {
            return;
        }
        if !self.both_connected() {
            debug!("coordinator: not streaming, a side is missing");
            return;
        }
        info!("coordinator: streaming started");
        self.streaming = true;
        self.snapshot.mark_dirty();
    }

    fn stop_streaming(&mut self) {
        if self.streaming {
            info!("coordinator: streaming stopped");
            self.streaming = false;
        }
    }

    fn set_simulation(&mut self, enabled: bool, now_ms: u64) {
        if enabled == self.simulating {
            return;
        }
        info!("coordinator: simulation {}", enabled);
        self.simulating = enabled;
        if enabled {
            self.sim_timer.start(now_ms);
        } else {
            self.sim_timer.stop();
        }
    }

    fn apply_profile(&mut self, profile: Option<DisplayProfile>) {
        let persistent = self.settings.render_mode == RenderMode::Persistent;
        if persistent && self.sink.is_connected() {
            render::delete_layouts(&mut self.sink, self.profile.as_ref());
            render::upload_layouts(&mut self.sink, profile.as_ref());
        }
        self.profile = profile;
        self.snapshot.mark_dirty();
    }

    fn start_scan(&mut self, target: ScanTarget, now_ms: u64, timeout_ms: u32) {
        if self.sink.is_connected() {
            debug!("coordinator: glasses already connected");
            return;
        }
        if self.scan.is_some() || self.sink.state().is_busy() {
            debug!("coordinator: scan or connect already running");
            return;
        }
        if self.sink.start_scan() {
            self.scan = Some(ScanSession {
                target,
                found: false,
            });
            self.scan_timeout.arm(now_ms, timeout_ms);
        }
    }

    fn end_scan(&mut self) {
        self.scan = None;
        self.scan_timeout.cancel();
    }

    fn on_discovered(&mut self, peripheral: Peripheral) {
        if !self.sink.on_discovered(peripheral.clone()) {
            return;
        }
        let Some(session) = self.scan.as_mut() else {
            return;
        };
        if session.found || !session.matches(&peripheral) {
            return;
        }
        session.found = true;
        self.scan_timeout.cancel();
        self.sink.connect(&peripheral);
    }

    fn on_scan_timeout(&mut self) {
        let pending = self.scan.as_ref().is_some_and(|s| !s.found);
        if !pending {
            debug!("coordinator: scan timeout after match ignored");
            return;
        }
        info!("coordinator: scan timed out");
        self.scan = None;
        self.sink.stop_scan();
    }

    fn on_sink_connected(&mut self, peripheral: Peripheral) {
        self.end_scan();
        let address = peripheral.address.clone();
        self.sink.on_connected(peripheral);

        if self.settings.last_sink_address.as_ref() != Some(&address) {
            self.settings.last_sink_address = Some(address.clone());
            self.paired = Some(address);
        }

        if self.settings.render_mode == RenderMode::Persistent {
            render::upload_layouts(&mut self.sink, self.profile.as_ref());
        }
        self.snapshot.mark_dirty();

        if self.ride == RideState::Recording {
            self.start_streaming();
        }
    }

    /// In-session reconnect tick
    fn session_reconnect(&mut self, now_ms: u64) {
        if self.sink.is_connected() {
            return;
        }
        if self.scan.is_some() || self.sink.state().is_busy() {
            debug!("coordinator: reconnect skipped, glasses busy");
            return;
        }
        let Some(address) = self.settings.last_sink_address.clone() else {
            debug!("coordinator: reconnect skipped, no paired glasses");
            return;
        };
        info!("coordinator: reconnecting glasses {}", address.as_str());
        self.start_scan(ScanTarget::Targeted(address), now_ms, SESSION_SCAN_WINDOW_MS);
    }

    fn try_flush(&mut self, now_ms: u64) {
        if !self.sink.is_connected() {
            return;
        }
        if !self
            .snapshot
            .is_flush_due(now_ms, FLUSH_INTERVAL_MS as u64)
        {
            return;
        }
        trace!("coordinator: flush");
        render::render(
            &mut self.sink,
            self.settings.render_mode,
            self.profile.as_ref(),
            &self.snapshot,
        );
        self.snapshot.mark_flushed(now_ms);
    }

    fn log_status(&self) {
        info!(
            "status: bridge {:?} source {:?} sink {:?} ride {:?} simulating {}",
            self.bridge,
            self.source.state(),
            self.sink.state(),
            self.ride,
            self.simulating
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;
    use crate::metrics::Metric;
    use crate::state::ConnectionState;
    use crate::testing::{glasses, MockSink, MockSource, SinkCall};
    use crate::traits::Stream;
    use proptest::prelude::*;

    type TestCoordinator = Coordinator<MockSource, MockSink>;

    const GLASSES: &str = "AA:BB:CC:DD:EE:01";
    const OTHER: &str = "AA:BB:CC:DD:EE:02";

    fn settings() -> BridgeSettings {
        BridgeSettings {
            auto_connect: false,
            status_log_interval_ms: 0,
            ..Default::default()
        }
    }

    fn paired_settings() -> BridgeSettings {
        let mut s = settings();
        let mut address = Address::new();
        address.push_str(GLASSES).unwrap();
        s.last_sink_address = Some(address);
        s
    }

    fn coordinator(settings: BridgeSettings) -> TestCoordinator {
        Coordinator::new(MockSource::new(), MockSink::new(), settings, None)
    }

    fn device() -> SourceDevice {
        let mut d = SourceDevice::default();
        d.name.push_str("Karoo").unwrap();
        d
    }

    fn connect_both(c: &mut TestCoordinator, now: u64) {
        c.start(now);
        c.handle(Event::SourceConnected(device()), now);
        c.handle(Event::ConnectSink(glasses(GLASSES)), now);
        c.handle(Event::SinkConnected(glasses(GLASSES)), now);
    }

    fn run(c: &mut TestCoordinator, from: u64, to: u64, step: u64) {
        let mut t = from;
        while t <= to {
            c.poll(t);
            t += step;
        }
    }

    fn profile(template: &str, ids: &[&str]) -> DisplayProfile {
        let mut p = DisplayProfile::default();
        p.template_id.push_str(template).unwrap();
        for id in ids {
            let mut f = FieldConfig::default();
            f.field_id.push_str(id).unwrap();
            p.fields.push(Some(f)).unwrap();
        }
        p
    }

    fn sink_calls(c: &TestCoordinator, pred: impl Fn(&SinkCall) -> bool) -> usize {
        c.sink().transport().count(pred)
    }

    #[test]
    fn test_bridge_state_sequence() {
        let mut c = coordinator(settings());
        assert_eq!(c.bridge_state(), &BridgeState::Idle);

        c.start(0);
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnecting);

        c.handle(Event::SourceConnected(device()), 10);
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnected);

        c.handle(Event::StartManualScan, 20);
        assert_eq!(c.bridge_state(), &BridgeState::SinkScanning);

        c.handle(Event::SinkDiscovered(glasses(GLASSES)), 30);
        assert_eq!(c.bridge_state(), &BridgeState::SinkConnecting);

        c.handle(Event::SinkConnected(glasses(GLASSES)), 40);
        assert_eq!(c.bridge_state(), &BridgeState::FullyConnected);

        c.handle(Event::RideStateChanged(RideState::Recording), 50);
        assert_eq!(c.bridge_state(), &BridgeState::Streaming);

        c.handle(Event::SinkDisconnected, 60);
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnected);
        assert!(!c.is_streaming());
    }

    #[test]
    fn test_streaming_needs_both_sides() {
        let mut c = coordinator(settings());
        c.start(0);
        c.handle(Event::SourceConnected(device()), 0);
        c.handle(Event::StartStreaming, 0);
        assert!(!c.is_streaming());

        c.handle(Event::ConnectSink(glasses(GLASSES)), 0);
        c.handle(Event::SinkConnected(glasses(GLASSES)), 0);
        c.handle(Event::StartStreaming, 0);
        c.handle(Event::StartStreaming, 0);
        assert!(c.is_streaming());

        c.handle(Event::StopStreaming, 0);
        assert_eq!(c.bridge_state(), &BridgeState::FullyConnected);
    }

    #[test]
    fn test_ten_mutations_one_flush() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        assert!(c.is_streaming());

        for i in 0..10u64 {
            c.poll(i * 100);
            c.handle(Event::MetricSample(Metric::Power, 200.0 + i as f32), i * 100);
        }
        assert_eq!(c.sink().transport().clears(), 0);

        run(&mut c, 1_000, 1_900, 100);
        assert_eq!(c.sink().transport().clears(), 1);
        assert_eq!(c.snapshot().last_flush_ms(), Some(1_000));
        assert!(c.sink().transport().texts().contains(&"209".into()));

        c.handle(Event::MetricSample(Metric::Power, 300.0), 1_500);
        run(&mut c, 2_000, 2_900, 100);
        assert_eq!(c.sink().transport().clears(), 2);
    }

    #[test]
    fn test_no_flush_without_changes() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        run(&mut c, 0, 10_000, 500);
        // the initial render only
        assert_eq!(c.sink().transport().clears(), 1);
    }

    proptest! {
        #[test]
        fn prop_flush_throttled(mut times in prop::collection::vec(0u64..1_000, 1..40)) {
            times.sort_unstable();
            let mut c = coordinator(settings());
            connect_both(&mut c, 0);
            c.handle(Event::RideStateChanged(RideState::Recording), 0);

            for t in times {
                c.poll(t);
                c.handle(Event::MetricSample(Metric::Speed, t as f32 / 100.0), t);
            }
            run(&mut c, 1_000, 1_999, 50);

            prop_assert_eq!(c.sink().transport().clears(), 1);
        }
    }

    #[test]
    fn test_session_reconnect_every_15s() {
        let mut c = coordinator(paired_settings());
        c.start(0);
        c.handle(Event::SourceConnected(device()), 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        assert_eq!(c.sink().transport().scans(), 0);

        run(&mut c, 0, 14_000, 1_000);
        assert_eq!(c.sink().transport().scans(), 0);
        run(&mut c, 15_000, 44_000, 1_000);
        assert_eq!(c.sink().transport().scans(), 2);
        run(&mut c, 45_000, 45_000, 1_000);
        assert_eq!(c.sink().transport().scans(), 3);

        c.handle(Event::SinkDiscovered(glasses(GLASSES)), 46_000);
        c.handle(Event::SinkConnected(glasses(GLASSES)), 46_500);
        assert!(c.is_streaming());

        run(&mut c, 47_000, 120_000, 1_000);
        assert_eq!(c.sink().transport().scans(), 3);
    }

    #[test]
    fn test_session_reconnect_stops_with_recording() {
        let mut c = coordinator(paired_settings());
        c.start(0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        c.handle(Event::RideStateChanged(RideState::Paused), 1_000);
        run(&mut c, 0, 60_000, 1_000);
        assert_eq!(c.sink().transport().scans(), 0);
    }

    #[test]
    fn test_session_reconnect_targets_known_address() {
        let mut c = coordinator(paired_settings());
        c.start(0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        c.poll(15_000);

        c.handle(Event::SinkDiscovered(glasses(OTHER)), 15_100);
        assert_eq!(sink_calls(&c, |call| matches!(call, SinkCall::Connect(_))), 0);
        c.handle(Event::SinkDiscovered(glasses(GLASSES)), 15_200);
        assert_eq!(
            c.sink().transport().calls.last(),
            Some(&SinkCall::Connect(GLASSES.into()))
        );
    }

    #[test]
    fn test_startup_auto_connect() {
        let mut settings = paired_settings();
        settings.auto_connect = true;
        let mut c = coordinator(settings);
        c.start(0);
        assert_eq!(c.sink().state(), &ConnectionState::Scanning);

        c.handle(Event::SinkDiscovered(glasses(OTHER)), 1_000);
        assert_eq!(c.sink().state(), &ConnectionState::Scanning);

        c.handle(Event::SinkDiscovered(glasses(GLASSES)), 2_000);
        assert_eq!(c.sink().state(), &ConnectionState::Connecting);

        // the timeout is moot once the target was found
        c.poll(30_000);
        assert_eq!(c.sink().state(), &ConnectionState::Connecting);

        c.handle(Event::SinkConnected(glasses(GLASSES)), 3_000);
        assert!(c.sink().is_connected());
        // already known, nothing new to persist
        assert_eq!(c.take_paired_address(), None);
    }

    #[test]
    fn test_startup_auto_connect_timeout() {
        let mut settings = paired_settings();
        settings.auto_connect = true;
        settings.auto_reconnect_timeout_ms = 20_000;
        let mut c = coordinator(settings);
        c.start(0);

        c.poll(19_999);
        assert_eq!(c.sink().state(), &ConnectionState::Scanning);
        c.poll(20_000);
        assert_eq!(c.sink().state(), &ConnectionState::Disconnected);
        assert!(c.sink().transport().calls.contains(&SinkCall::StopScan));

        // falls back to the in-session policy
        c.handle(Event::RideStateChanged(RideState::Recording), 21_000);
        c.poll(36_000);
        assert_eq!(c.sink().transport().scans(), 2);
    }

    #[test]
    fn test_no_auto_connect_without_address() {
        let mut settings = settings();
        settings.auto_connect = true;
        let mut c = coordinator(settings);
        c.start(0);
        assert_eq!(c.sink().transport().scans(), 0);
    }

    #[test]
    fn test_manual_scan_connects_first_found() {
        let mut c = coordinator(settings());
        c.start(0);
        c.handle(Event::StartManualScan, 0);
        c.handle(Event::SinkDiscovered(glasses(OTHER)), 5_000);
        c.handle(Event::SinkDiscovered(glasses(GLASSES)), 5_100);
        assert_eq!(sink_calls(&c, |call| matches!(call, SinkCall::Connect(_))), 1);

        c.handle(Event::SinkConnected(glasses(OTHER)), 6_000);
        let paired = c.take_paired_address().unwrap();
        assert_eq!(paired.as_str(), OTHER);
        assert_eq!(c.take_paired_address(), None);
        assert_eq!(c.settings().last_sink_address, Some(paired));
    }

    #[test]
    fn test_manual_scan_aborts_after_30s() {
        let mut c = coordinator(settings());
        c.start(0);
        c.handle(Event::StartManualScan, 1_000);
        assert_eq!(c.next_deadline(), Some(31_000));

        c.poll(30_999);
        assert_eq!(c.sink().state(), &ConnectionState::Scanning);
        c.poll(31_000);
        assert_eq!(c.sink().state(), &ConnectionState::Disconnected);
        assert_eq!(c.next_deadline(), None);
    }

    #[test]
    fn test_one_scan_session_at_a_time() {
        let mut c = coordinator(settings());
        c.start(0);
        c.handle(Event::StartManualScan, 0);
        c.handle(Event::StartManualScan, 100);
        assert_eq!(c.sink().transport().scans(), 1);

        c.handle(Event::StopScan, 200);
        c.handle(Event::StartManualScan, 300);
        assert_eq!(c.sink().transport().scans(), 2);
    }

    #[test]
    fn test_simulator_feeds_flush() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::SetSimulation(true), 0);
        assert!(c.status().simulating);

        run(&mut c, 0, 2_000, 500);
        let speed = c.snapshot().value(Metric::Speed).unwrap();
        assert!(c.sink().transport().texts().iter().any(|t| t == speed));
        let flushes = c.sink().transport().clears();
        assert_eq!(flushes, 2);

        c.handle(Event::SetSimulation(false), 2_100);
        run(&mut c, 2_500, 10_000, 500);
        assert_eq!(c.sink().transport().clears(), flushes);
    }

    #[test]
    fn test_simulator_last_write_wins() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::SetSimulation(true), 0);
        c.poll(2_000);
        c.handle(Event::MetricSample(Metric::Power, 999.0), 2_100);
        assert_eq!(c.snapshot().value(Metric::Power), Some("999"));
        c.poll(4_000);
        assert_ne!(c.snapshot().value(Metric::Power), Some("999"));
    }

    #[test]
    fn test_subscription_error_isolated() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);

        c.handle(Event::SubscriptionError(Stream::Metric(Metric::Power)), 100);
        assert_eq!(c.bridge_state(), &BridgeState::Streaming);
        assert_eq!(c.source().subscribed().count(), Metric::COUNT);
        assert!(c.source().is_connected());
    }

    #[test]
    fn test_source_backoff_then_error() {
        let mut c = coordinator(settings());
        c.start(0);
        c.handle(Event::SourceConnected(device()), 0);
        c.handle(Event::SourceDisconnected, 0);
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnecting);

        let mut gaps = std::vec::Vec::new();
        let mut now = 0;
        while let Some(due) = c.next_deadline() {
            gaps.push(due - now);
            now = due;
            c.poll(now);
            c.handle(Event::SourceConnectFailed, now);
        }
        assert_eq!(gaps, [1_000, 2_000, 4_000, 8_000, 16_000]);
        assert!(matches!(c.bridge_state(), BridgeState::Error(_)));

        c.handle(Event::ReconnectSource, now);
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnecting);
        c.handle(Event::SourceConnected(device()), now);
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnected);
    }

    #[test]
    fn test_source_loss_stops_streaming() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        assert!(c.is_streaming());
        assert!(c.flush_timer.is_running());

        c.handle(Event::SourceDisconnected, 200);
        assert!(!c.is_streaming());
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnecting);
        assert!(!c.flush_timer.is_running());
        // first source retry, no flush tick at 1 000
        assert_eq!(c.next_deadline(), Some(1_200));

        let clears = c.sink().transport().clears();
        c.handle(Event::MetricSample(Metric::Speed, 30.0), 300);
        c.poll(1_000);
        assert_eq!(c.sink().transport().clears(), clears);
    }

    #[test]
    fn test_unknown_field_renders_na() {
        let mut c = Coordinator::new(
            MockSource::new(),
            MockSink::new(),
            settings(),
            Some(profile("2D", &["speed", "gradient"])),
        );
        connect_both(&mut c, 0);
        c.handle(Event::StartStreaming, 0);
        c.poll(1_000);

        let texts = c.sink().transport().texts();
        assert!(texts.contains(&"N/A".into()));
        assert!(texts.contains(&"--".into()));
    }

    #[test]
    fn test_persistent_mode() {
        let mut sink = MockSink::new();
        sink.persistent_layouts = true;
        let mut s = settings();
        s.render_mode = RenderMode::Persistent;
        let mut c = Coordinator::new(MockSource::new(), sink, s, None);

        connect_both(&mut c, 0);
        assert_eq!(sink_calls(&c, |call| matches!(call, SinkCall::SaveLayout(_))), 3);

        c.handle(Event::StartStreaming, 0);
        c.handle(Event::MetricSample(Metric::Speed, 10.0), 500);
        c.poll(1_000);
        assert!(c
            .sink()
            .transport()
            .calls
            .contains(&SinkCall::DisplayLayout(1, "36.0".into())));
        assert_eq!(c.sink().transport().clears(), 0);

        c.handle(Event::ApplyProfile(Some(profile("4D", &["power"]))), 1_500);
        assert_eq!(sink_calls(&c, |call| matches!(call, SinkCall::DeleteLayout(_))), 3);
        assert_eq!(sink_calls(&c, |call| matches!(call, SinkCall::SaveLayout(_))), 7);
        assert!(c.snapshot().is_dirty());
    }

    #[test]
    fn test_apply_profile_direct() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::StartStreaming, 0);
        c.poll(1_000);

        c.handle(Event::ApplyProfile(Some(profile("1D", &["cadence"]))), 1_200);
        assert!(c.profile().is_some());
        assert_eq!(sink_calls(&c, |call| matches!(call, SinkCall::SaveLayout(_))), 0);
        c.poll(2_000);
        assert_eq!(c.sink().transport().clears(), 2);
    }

    #[test]
    fn test_disconnect_on_idle() {
        let mut s = settings();
        s.disconnect_on_idle = true;
        let mut c = coordinator(s);
        connect_both(&mut c, 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        c.handle(Event::RideStateChanged(RideState::Idle), 1_000);

        assert!(!c.sink().is_connected());
        assert!(c.sink().transport().calls.contains(&SinkCall::Disconnect));
        assert_eq!(c.bridge_state(), &BridgeState::SourceConnected);
    }

    #[test]
    fn test_idle_keeps_glasses_by_default() {
        let mut c = coordinator(settings());
        connect_both(&mut c, 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        c.handle(Event::RideStateChanged(RideState::Idle), 1_000);
        assert!(c.sink().is_connected());
        assert!(!c.is_streaming());
    }

    #[test]
    fn test_status_changes() {
        let mut c = coordinator(settings());
        let first = c.take_status_change().unwrap();
        assert_eq!(first.bridge, BridgeState::Idle);
        assert_eq!(c.take_status_change(), None);

        c.start(0);
        let status = c.take_status_change().unwrap();
        assert_eq!(status.source, ConnectionState::Connecting);
        assert_eq!(c.take_status_change(), None);
    }

    #[test]
    fn test_status_log_timer() {
        let mut s = settings();
        s.status_log_interval_ms = 30_000;
        let mut c = coordinator(s);
        c.start(0);
        assert_eq!(c.next_deadline(), Some(30_000));
        c.poll(30_000);
        assert_eq!(c.next_deadline(), Some(60_000));
    }

    #[test]
    fn test_shutdown_cancels_everything() {
        let mut s = paired_settings();
        s.auto_connect = true;
        s.status_log_interval_ms = 30_000;
        let mut c = coordinator(s);
        c.start(0);
        c.handle(Event::SourceConnected(device()), 0);
        c.handle(Event::RideStateChanged(RideState::Recording), 0);
        c.handle(Event::SetSimulation(true), 0);
        assert!(c.next_deadline().is_some());

        c.handle(Event::Shutdown, 100);
        assert!(c.is_shut_down());
        assert_eq!(c.next_deadline(), None);
        assert_eq!(c.bridge_state(), &BridgeState::Idle);

        c.handle(Event::ConnectSource, 200);
        assert_eq!(c.source().state(), &ConnectionState::Disconnected);
    }
}
