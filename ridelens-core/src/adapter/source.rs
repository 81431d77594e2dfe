//! Ride computer adapter
//!
//! `Disconnected -> Connecting -> Connected`. An unsolicited disconnect
//! enters `Reconnecting(n)` with exponential backoff; running out of
//! attempts leaves the adapter in `Error` until [`SourceAdapter::reconnect`]
//! is called.

use heapless::Vec;

use crate::metrics::Metric;
use crate::state::ConnectionState;
use crate::traits::{SourceDevice, SourceTransport, Stream, SubscriptionId};

/// Ride state plus every metric stream
const MAX_SUBSCRIPTIONS: usize = Metric::COUNT + 1;

/// Exponential backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BackoffPolicy {
    pub initial_ms: u32,
    pub max_ms: u32,
    pub max_attempts: u8,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_ms: 1_000,
            max_ms: 30_000,
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    /// Delay before attempt `attempt` (1-based)
    pub fn delay_ms(&self, attempt: u8) -> u32 {
        let shift = attempt.saturating_sub(1).min(31);
        let delay = (self.initial_ms as u64) << shift;
        delay.min(self.max_ms as u64) as u32
    }
}

/// State machine around a [`SourceTransport`]
pub struct SourceAdapter<T> {
    transport: T,
    state: ConnectionState<SourceDevice>,
    policy: BackoffPolicy,
    /// Current reconnect attempt, 0 outside a reconnect sequence
    attempt: u8,
    retry_at: Option<u64>,
    subscriptions: Vec<(Stream, SubscriptionId), MAX_SUBSCRIPTIONS>,
}

impl<T: SourceTransport> SourceAdapter<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            policy: BackoffPolicy::default(),
            attempt: 0,
            retry_at: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn state(&self) -> &ConnectionState<SourceDevice> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Streams with a live subscription
    pub fn subscribed(&self) -> impl Iterator<Item = Stream> + '_ {
        self.subscriptions.iter().map(|(stream, _)| *stream)
    }

    /// When the next reconnect attempt is due
    pub fn next_deadline(&self) -> Option<u64> {
        self.retry_at
    }

    fn set_state(&mut self, state: ConnectionState<SourceDevice>) {
        if self.state != state {
            debug!("source: {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Initiate the first connection
    pub fn connect(&mut self) {
        if self.is_connected() || self.state.is_busy() {
            debug!("source: connect ignored in {:?}", self.state);
            return;
        }
        self.attempt = 0;
        self.retry_at = None;
        self.set_state(ConnectionState::Connecting);
        if let Err(e) = self.transport.connect() {
            warn!("source: connect failed: {:?}", e);
            self.set_state(ConnectionState::error("source connect failed"));
        }
    }

    /// Explicit reconnect, resetting the attempt counter from any state
    pub fn reconnect(&mut self) {
        if self.is_connected() {
            debug!("source: already connected");
            return;
        }
        info!("source: manual reconnect");
        self.set_state(ConnectionState::Disconnected);
        self.connect();
    }

    /// Connection completed: subscribe to every stream
    pub fn on_connected(&mut self, device: SourceDevice) {
        info!("source: connected to {}", device.name.as_str());
        self.attempt = 0;
        self.retry_at = None;
        self.set_state(ConnectionState::Connected(device));

        self.subscriptions.clear();
        let streams = core::iter::once(Stream::RideState).chain(Metric::ALL.map(Stream::Metric));
        for stream in streams {
            match self.transport.subscribe(stream) {
                Ok(id) => {
                    let _ = self.subscriptions.push((stream, id));
                }
                Err(e) => warn!("source: subscribe {:?} failed: {:?}", stream, e),
            }
        }
    }

    /// Connection attempt failed
    pub fn on_connect_failed(&mut self, now_ms: u64) {
        match self.state {
            ConnectionState::Reconnecting(_) => {
                warn!("source: reconnect attempt {} failed", self.attempt);
                self.schedule_retry(now_ms);
            }
            ConnectionState::Connecting => {
                warn!("source: connection failed");
                self.set_state(ConnectionState::error("source connect failed"));
            }
            _ => {}
        }
    }

    /// Link lost
    pub fn on_disconnected(&mut self, now_ms: u64) {
        match self.state {
            ConnectionState::Connected(_) => {
                warn!("source: link lost");
                self.subscriptions.clear();
                self.attempt = 0;
                self.schedule_retry(now_ms);
            }
            ConnectionState::Reconnecting(_) => self.schedule_retry(now_ms),
            _ => {}
        }
    }

    fn schedule_retry(&mut self, now_ms: u64) {
        if self.attempt >= self.policy.max_attempts {
            warn!("source: giving up after {} attempts", self.attempt);
            self.retry_at = None;
            self.attempt = 0;
            self.set_state(ConnectionState::error("source reconnect exhausted"));
            return;
        }
        self.attempt += 1;
        let delay = self.policy.delay_ms(self.attempt);
        info!("source: reconnect attempt {} in {} ms", self.attempt, delay);
        self.retry_at = Some(now_ms + delay as u64);
        self.set_state(ConnectionState::Reconnecting(self.attempt));
    }

    /// Fire a due reconnect attempt
    pub fn poll(&mut self, now_ms: u64) {
        match self.retry_at {
            Some(at) if at <= now_ms => {}
            _ => return,
        }
        self.retry_at = None;
        info!("source: reconnect attempt {}", self.attempt);
        if let Err(e) = self.transport.connect() {
            warn!("source: reconnect failed: {:?}", e);
            self.schedule_retry(now_ms);
        }
    }

    /// A single stream failed; the others are unaffected
    pub fn on_subscription_error(&mut self, stream: Stream) {
        warn!("source: stream {:?} failed", stream);
        if let Some(pos) = self.subscriptions.iter().position(|(s, _)| *s == stream) {
            let (_, id) = self.subscriptions.swap_remove(pos);
            self.transport.unsubscribe(id);
        }
    }

    /// Tear down subscriptions and the connection
    pub fn disconnect(&mut self) {
        for (_, id) in self.subscriptions.iter() {
            self.transport.unsubscribe(*id);
        }
        self.subscriptions.clear();
        if !matches!(self.state, ConnectionState::Disconnected) {
            self.transport.disconnect();
        }
        self.attempt = 0;
        self.retry_at = None;
        self.set_state(ConnectionState::Disconnected);
    }
}
