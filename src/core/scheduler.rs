//! Cancellable repeating tickers driving playback advancement.
//!
//! The player does not talk to wall clocks directly; it owns a `Ticker`
//! and asks it to run a callback at a fixed interval. `IntervalTicker` is
//! the production implementation (background thread). `ManualTicker` hands
//! tick control to the caller, which is what the playback tests use to
//! step virtual time deterministically, and what a host with its own
//! frame loop can use instead of a thread.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Sender, bounded, select, tick};
use log::trace;

/// Callback run once per tick. Returning `false` ends the task from the
/// inside (the player uses this to stop at a range boundary without
/// needing a handle back to the ticker).
pub type TickFn = Box<dyn FnMut() -> bool + Send>;

/// A cancellable repeating task.
///
/// At most one task is live per ticker: `start` on an active ticker
/// cancels the previous task first, so starting is idempotent.
pub trait Ticker: Send {
    fn start(&mut self, interval: Duration, tick_fn: TickFn);
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

/// Thread-backed ticker using a crossbeam tick channel.
#[derive(Default)]
pub struct IntervalTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    active: Arc<AtomicBool>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, interval: Duration, mut tick_fn: TickFn) {
        self.cancel();

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);

        let handle = std::thread::Builder::new()
            .name("timewalk-ticker".into())
            .spawn(move || {
                let ticks = tick(interval);
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticks) -> _ => {
                            if !tick_fn() {
                                break;
                            }
                        }
                    }
                }
                flag.store(false, Ordering::SeqCst);
                trace!("Ticker thread exited");
            })
            .unwrap_or_else(|e| panic!("failed to spawn ticker thread: {e}"));

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
        self.active = active;
    }

    fn cancel(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        self.active.store(false, Ordering::SeqCst);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Caller-driven ticker. `start` stores the callback; `ManualHandle::fire`
/// runs one tick. No threads, no wall clock.
#[derive(Default)]
pub struct ManualTicker {
    slot: Arc<Mutex<Option<TickFn>>>,
}

impl ManualTicker {
    /// Returns the ticker (inject into the player) and a handle kept by the
    /// caller to pump ticks.
    pub fn new() -> (Self, ManualHandle) {
        let slot: Arc<Mutex<Option<TickFn>>> = Arc::new(Mutex::new(None));
        let handle = ManualHandle {
            slot: Arc::clone(&slot),
        };
        (Self { slot }, handle)
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, _interval: Duration, tick_fn: TickFn) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tick_fn);
    }

    fn cancel(&mut self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn is_active(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

/// Pump for a `ManualTicker`.
#[derive(Clone)]
pub struct ManualHandle {
    slot: Arc<Mutex<Option<TickFn>>>,
}

impl ManualHandle {
    /// Run one tick. Returns false if no task is active (or the task just
    /// ended itself).
    pub fn fire(&self) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_mut() {
            Some(tick_fn) => {
                if tick_fn() {
                    true
                } else {
                    *slot = None;
                    false
                }
            }
            None => false,
        }
    }

    /// Run up to `n` ticks, stopping early if the task ends.
    pub fn fire_n(&self, n: usize) -> usize {
        (0..n).take_while(|_| self.fire()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_ticker_fires() {
        let (mut ticker, handle) = ManualTicker::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        ticker.start(
            Duration::from_millis(100),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );
        assert!(ticker.is_active());
        assert_eq!(handle.fire_n(3), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        ticker.cancel();
        assert!(!ticker.is_active());
        assert!(!handle.fire());
    }

    #[test]
    fn test_manual_ticker_self_stop() {
        let (mut ticker, handle) = ManualTicker::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        ticker.start(
            Duration::from_millis(100),
            Box::new(move || c.fetch_add(1, Ordering::SeqCst) < 1),
        );
        // Second tick returns false and clears the task
        assert_eq!(handle.fire_n(10), 1);
        assert!(!ticker.is_active());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_interval_ticker_runs_and_cancels() {
        let mut ticker = IntervalTicker::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        ticker.start(
            Duration::from_millis(5),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );
        assert!(ticker.is_active());
        std::thread::sleep(Duration::from_millis(60));
        ticker.cancel();
        assert!(!ticker.is_active());

        let seen = count.load(Ordering::SeqCst);
        assert!(seen > 0);
        // No ticks after cancel
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn test_restart_cancels_previous() {
        let mut ticker = IntervalTicker::new();
        let first = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&first);
        ticker.start(
            Duration::from_millis(5),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );
        // Restart with a different task; the old thread must be gone
        let second = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&second);
        ticker.start(
            Duration::from_millis(5),
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );
        let first_after_restart = first.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(40));
        ticker.cancel();
        assert_eq!(first.load(Ordering::SeqCst), first_after_restart);
        assert!(second.load(Ordering::SeqCst) > 0);
    }
}
