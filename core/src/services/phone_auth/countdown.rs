//! Display countdown for the verification window
//!
//! The countdown only drives "time remaining" rendering. Expiry of the
//! provider's own window is reported separately by the provider.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use super::traits::{TickSource, Ticker};

/// Countdown lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownState {
    /// Never started, or cancelled
    Idle,
    /// Ticking
    Running { elapsed: u64 },
    /// Reached its bound
    Stopped { elapsed: u64 },
}

/// Result of feeding one tick to the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still running after this tick
    Continue,
    /// This tick reached the bound
    Stopped,
    /// Countdown was not running
    Ignored,
}

/// Countdown bounded by a whole number of one-second ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    bound: u64,
    state: CountdownState,
}

impl Countdown {
    /// Idle countdown for the given window
    pub fn new(timeout: Duration) -> Self {
        Self {
            bound: timeout.as_secs(),
            state: CountdownState::Idle,
        }
    }

    /// (Re)start from zero elapsed ticks; a zero window stops immediately
    pub fn start(&mut self, timeout: Duration) {
        self.bound = timeout.as_secs();
        self.state = if self.bound == 0 {
            CountdownState::Stopped { elapsed: 0 }
        } else {
            CountdownState::Running { elapsed: 0 }
        };
    }

    /// Advance by one tick
    pub fn tick(&mut self) -> TickOutcome {
        match self.state {
            CountdownState::Running { elapsed } => {
                let elapsed = elapsed + 1;
                if elapsed >= self.bound {
                    self.state = CountdownState::Stopped { elapsed };
                    TickOutcome::Stopped
                } else {
                    self.state = CountdownState::Running { elapsed };
                    TickOutcome::Continue
                }
            }
            CountdownState::Idle | CountdownState::Stopped { .. } => TickOutcome::Ignored,
        }
    }

    /// Return to idle
    pub fn cancel(&mut self) {
        self.state = CountdownState::Idle;
    }

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CountdownState::Running { .. })
    }

    /// Ticks counted since the last start
    pub fn elapsed(&self) -> u64 {
        match self.state {
            CountdownState::Idle => 0,
            CountdownState::Running { elapsed } | CountdownState::Stopped { elapsed } => elapsed,
        }
    }

    /// Window length minus elapsed ticks
    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.bound.saturating_sub(self.elapsed()))
    }
}

/// Tick source backed by `tokio::time::interval`
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalTickSource;

impl TickSource for IntervalTickSource {
    fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Box::new(IntervalTicker { interval })
    }
}

struct IntervalTicker {
    interval: Interval,
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
