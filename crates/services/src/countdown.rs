//! Countdown clock for time-limited sessions.
//!
//! A scheduled task that decrements once per second, publishes the
//! remaining time, and fires a single completion action at zero. The
//! handle returned at start cancels the task with no further ticks.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Handle to a running countdown.
///
/// Dropping the handle cancels the countdown, so a torn-down session can
/// never receive a late tick or a duplicate expiry.
#[derive(Debug)]
pub struct CountdownHandle {
    task: JoinHandle<()>,
    remaining: watch::Receiver<u32>,
}

impl CountdownHandle {
    /// Seconds left on the clock.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// A watch receiver that observes every decrement.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.remaining.clone()
    }

    /// Stop the countdown. No further ticks, no expiry action.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Whether the countdown has run to zero or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One-shot countdown factory.
pub struct Countdown;

impl Countdown {
    /// Start a countdown from `seconds`, firing `on_expire` exactly once
    /// when it reaches zero.
    ///
    /// Untimed sessions must not start a countdown at all; callers guard
    /// on the test's time limit before calling this.
    pub fn start<F, Fut>(seconds: u32, on_expire: F) -> CountdownHandle
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = watch::channel(seconds);
        let task = tokio::spawn(async move {
            let mut left = seconds;
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first interval tick completes immediately.
            ticker.tick().await;

            while left > 0 {
                ticker.tick().await;
                left -= 1;
                let _ = tx.send(left);
            }

            on_expire().await;
        });

        CountdownHandle {
            task,
            remaining: rx,
        }
    }
}

/// Render seconds as `m:ss` for the countdown display.
#[must_use]
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
