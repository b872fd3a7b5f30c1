//! Button edge latch and debounce protocol

use portable_atomic::{AtomicU32, AtomicU8, Ordering};
use crate::hal::{Duration, Instant};
use crate::types::Button;

const IDLE: u8 = 0;
/// An edge handler has claimed the latch and is filling it in
const ARMING: u8 = 1;
const DEBOUNCING: u8 = 2;

/// Atomic single-slot latch for the pending button press.
/// Safe for use in interrupt contexts.
///
/// The first edge claims the latch and starts the debounce window; every
/// further edge, from any button, is dropped until the main loop has
/// collected the press. Mechanical bounce therefore never restarts or
/// duplicates the pending event.
pub struct ButtonLatch {
    phase: AtomicU8,
    button: AtomicU8,
    started_ms: AtomicU32,
}

impl ButtonLatch {
    /// Create an idle latch
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(IDLE),
            button: AtomicU8::new(0),
            started_ms: AtomicU32::new(0),
        }
    }

    /// Record an edge (called from interrupt handler).
    /// Returns true if the edge started a new debounce window.
    pub fn on_edge(&self, button: Button, now: Instant) -> bool {
        if self
            .phase
            .compare_exchange(IDLE, ARMING, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            trace!("edge on {:?} suppressed while debouncing", button);
            return false;
        }

        self.button.store(button.to_raw(), Ordering::Relaxed);
        self.started_ms.store(now.as_millis(), Ordering::Relaxed);
        self.phase.store(DEBOUNCING, Ordering::Release);
        true
    }

    /// Collect the press once it has been stable for `debounce`.
    /// Returns `None` while idle or still debouncing.
    pub fn poll(&self, now: Instant, debounce: Duration) -> Option<Button> {
        if self.phase.load(Ordering::Acquire) != DEBOUNCING {
            return None;
        }

        let started = Instant::from_millis(self.started_ms.load(Ordering::Relaxed));
        if now.duration_since(started) < debounce {
            return None;
        }

        let button = Button::from_raw(self.button.load(Ordering::Relaxed));
        self.phase.store(IDLE, Ordering::Release);
        button
    }

    /// Button being debounced and when its edge arrived, if any
    pub fn pending(&self) -> Option<(Button, Instant)> {
        if self.phase.load(Ordering::Acquire) != DEBOUNCING {
            return None;
        }
        let button = Button::from_raw(self.button.load(Ordering::Relaxed))?;
        let started = Instant::from_millis(self.started_ms.load(Ordering::Relaxed));
        Some((button, started))
    }

    /// Returns true while a press is waiting out its debounce window
    pub fn is_debouncing(&self) -> bool {
        self.phase.load(Ordering::Acquire) != IDLE
    }
}

impl Default for ButtonLatch {
    fn default() -> Self {
        Self::new()
    }
}
