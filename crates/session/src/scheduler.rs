//! Restartable poll timers
//!
//! A `PollTimer` ticks at a period that a `TimerControl` can change or clear
//! at any time. A period of 0 s or of `STOP_SECONDS` or more stops the timer
//! until a valid period is set again.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Interval (in seconds) at and above which a timer is stopped
pub const STOP_SECONDS: u64 = 301;

/// Map an interval setting in seconds to a timer period
pub fn period_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 || secs >= STOP_SECONDS {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

/// Create a timer and the control that restarts it
pub fn poll_timer(name: &'static str, period: Option<Duration>) -> (PollTimer, TimerControl) {
    let (tx, rx) = watch::channel(period.filter(|p| !p.is_zero()));
    (
        PollTimer {
            name,
            rx,
            armed: None,
            control_closed: false,
        },
        TimerControl { tx },
    )
}

#[derive(Debug, Clone)]
pub struct TimerControl {
    tx: watch::Sender<Option<Duration>>,
}

impl TimerControl {
    /// Restart with a new period; `None` stops the timer
    pub fn set_period(&self, period: Option<Duration>) {
        self.tx.send_replace(period.filter(|p| !p.is_zero()));
    }

    /// Restart from an interval setting in seconds (0 or >= 301 stops)
    pub fn set_seconds(&self, secs: u64) {
        self.set_period(period_from_secs(secs));
    }

    pub fn stop(&self) {
        self.set_period(None);
    }

    pub fn period(&self) -> Option<Duration> {
        *self.tx.borrow()
    }
}

enum Wake {
    Elapsed,
    Changed { closed: bool },
}

#[derive(Debug)]
pub struct PollTimer {
    name: &'static str,
    rx: watch::Receiver<Option<Duration>>,
    /// Next deadline and the period it was armed with
    armed: Option<(Instant, Duration)>,
    control_closed: bool,
}

impl PollTimer {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Option<Duration> {
        *self.rx.borrow()
    }

    /// Wait for the next tick
    ///
    /// The first tick comes one full period after the timer (re)starts.
    /// Returns `None` once the timer is stopped and its control is gone,
    /// since it can never tick again.
    pub async fn tick(&mut self) -> Option<Instant> {
        loop {
            let period = *self.rx.borrow_and_update();

            let Some(period) = period else {
                self.armed = None;
                if self.control_closed || self.rx.changed().await.is_err() {
                    return None;
                }
                debug!(timer = self.name, period = ?self.period(), "timer restarted");
                continue;
            };

            let deadline = match self.armed {
                Some((deadline, armed_period)) if armed_period == period => deadline,
                _ => {
                    let deadline = Instant::now() + period;
                    self.armed = Some((deadline, period));
                    deadline
                }
            };
            let closed = self.control_closed;
            let wake = {
                let rx = &mut self.rx;
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => Wake::Elapsed,
                    changed = rx.changed(), if !closed => Wake::Changed { closed: changed.is_err() },
                }
            };

            match wake {
                Wake::Elapsed => {
                    // missed ticks are skipped, not replayed
                    let now = Instant::now();
                    let next = deadline + period;
                    let next = if next > now { next } else { now + period };
                    self.armed = Some((next, period));
                    return Some(deadline);
                }
                Wake::Changed { closed: true } => self.control_closed = true,
                Wake::Changed { closed: false } => {
                    self.armed = None;
                    debug!(timer = self.name, period = ?self.period(), "timer period changed");
                }
            }
        }
    }
}
