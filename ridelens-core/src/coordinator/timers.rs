//! Named cancellable timers
//!
//! Timers are plain deadlines in milliseconds. The coordinator fires them
//! from `poll` and reports the earliest one through `next_deadline`.

/// Repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    period_ms: u32,
    next: Option<u64>,
}

impl PeriodicTimer {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            next: None,
        }
    }

    /// Start the timer; the first tick is one period from `now_ms`
    pub fn start(&mut self, now_ms: u64) {
        self.next = Some(now_ms + self.period_ms as u64);
    }

    /// Start the timer unless it is already running
    pub fn ensure_running(&mut self, now_ms: u64) {
        if self.next.is_none() {
            self.start(now_ms);
        }
    }

    pub fn stop(&mut self) {
        self.next = None;
    }

    pub fn is_running(&self) -> bool {
        self.next.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.next
    }

    /// Consume a due tick and schedule the next one
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.next {
            Some(at) if at <= now_ms => {
                self.next = Some(now_ms + self.period_ms as u64);
                true
            }
            _ => false,
        }
    }
}

/// Single-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OneShotTimer {
    at: Option<u64>,
}

impl OneShotTimer {
    pub const fn new() -> Self {
        Self { at: None }
    }

    pub fn arm(&mut self, now_ms: u64, delay_ms: u32) {
        self.at = Some(now_ms + delay_ms as u64);
    }

    pub fn cancel(&mut self) {
        self.at = None;
    }

    pub fn deadline(&self) -> Option<u64> {
        self.at
    }

    /// Consume the timer if it is due
    pub fn fire(&mut self, now_ms: u64) -> bool {
        match self.at {
            Some(at) if at <= now_ms => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}
