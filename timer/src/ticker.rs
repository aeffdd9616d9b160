//! Countdown ticker.
//!
//! While a cycle is running, a background task sends a [`CountdownTick`]
//! every tick interval. The receiver answers each tick by asking the
//! [`Session`](crate::session::Session) to recompute elapsed time from the
//! clock, so a tick carries no payload.
//!
//! The ticker is started when a cycle becomes active and cancelled as soon
//! as the cycle leaves the running state. Cancelling aborts the task; no
//! further ticks are sent once [`CountdownTicker::cancel`] returns.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//! use pomodoro_timer::ticker::CountdownTicker;
//!
//! # async fn example() {
//! let (tx, mut rx) = mpsc::channel(16);
//! let mut ticker = CountdownTicker::new(Duration::from_secs(1));
//! ticker.start(tx);
//!
//! while rx.recv().await.is_some() {
//!     // recompute the countdown
//! #   break;
//! }
//! ticker.cancel();
//! # }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::config::DEFAULT_TICK_INTERVAL_MS;

/// Message sent once per tick interval while a cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownTick;

/// Owns the background task that produces countdown ticks.
#[derive(Debug)]
pub struct CountdownTicker {
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Default for CountdownTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TICK_INTERVAL_MS))
    }
}

impl CountdownTicker {
    /// Creates a stopped ticker.
    ///
    /// A zero interval is replaced by one millisecond, since
    /// [`tokio::time::interval`] rejects zero.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            handle: None,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// The tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Starts sending ticks on `tx`, replacing any ticker already running.
    ///
    /// The first tick arrives one interval after the call. The task ends on
    /// its own when the receiver is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, tx: mpsc::Sender<CountdownTick>) {
        self.cancel();

        let period = self.interval;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; consume it.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if tx.send(CountdownTick).await.is_err() {
                    debug!("Countdown receiver dropped, stopping ticker");
                    break;
                }
            }
        }));
        debug!(interval_ms = period.as_millis() as u64, "Countdown ticker started");
    }

    /// Stops the ticker. Returns `true` if one was running.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                debug!("Countdown ticker cancelled");
                true
            }
            None => false,
        }
    }

    /// Returns `true` while the ticker task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Instant};
    use tokio_test::{assert_pending, task};

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[test]
    fn new_ticker_is_stopped() {
        let ticker = CountdownTicker::new(INTERVAL);
        assert!(!ticker.is_running());
        assert_eq!(ticker.interval(), INTERVAL);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let ticker = CountdownTicker::new(Duration::ZERO);
        assert_eq!(ticker.interval(), Duration::from_millis(1));
    }

    #[test]
    fn default_uses_one_second() {
        assert_eq!(CountdownTicker::default().interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut ticker = CountdownTicker::new(INTERVAL);
        let started = Instant::now();
        ticker.start(tx);
        assert!(ticker.is_running());

        for _ in 0..3 {
            assert_eq!(rx.recv().await, Some(CountdownTick));
        }

        assert_eq!(started.elapsed(), INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_before_first_interval() {
        let (tx, mut rx) = mpsc::channel(16);
        let mut ticker = CountdownTicker::new(INTERVAL);
        ticker.start(tx);
        tokio::task::yield_now().await;

        let mut recv = task::spawn(rx.recv());
        assert_pending!(recv.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_ticks() {
        let (tx, mut rx) = mpsc::channel(16);
        let _keep_open = tx.clone();
        let mut ticker = CountdownTicker::new(INTERVAL);
        ticker.start(tx);

        assert_eq!(rx.recv().await, Some(CountdownTick));
        assert!(ticker.cancel());
        assert!(!ticker.is_running());
        while rx.try_recv().is_ok() {}

        let waited = timeout(INTERVAL * 5, rx.recv()).await;
        assert!(waited.is_err(), "no tick expected after cancel");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_when_stopped_returns_false() {
        let mut ticker = CountdownTicker::new(INTERVAL);
        assert!(!ticker.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_ticker() {
        let (first_tx, mut first_rx) = mpsc::channel(16);
        let (second_tx, mut second_rx) = mpsc::channel(16);
        let mut ticker = CountdownTicker::new(INTERVAL);

        ticker.start(first_tx);
        ticker.start(second_tx);

        assert_eq!(second_rx.recv().await, Some(CountdownTick));
        // The first task was aborted, which dropped its sender.
        assert_eq!(first_rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_aborts_task() {
        let (tx, mut rx) = mpsc::channel(16);
        {
            let mut ticker = CountdownTicker::new(INTERVAL);
            ticker.start(tx);
        }
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn task_exits_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(16);
        let mut ticker = CountdownTicker::new(INTERVAL);
        ticker.start(tx);
        drop(rx);

        tokio::time::sleep(INTERVAL * 2).await;
        tokio::task::yield_now().await;
        assert!(!ticker.is_running());
    }
}
