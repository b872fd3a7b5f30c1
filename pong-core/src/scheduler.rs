//! Priority scheduler binding the interrupt contexts to the game
//!
//! Interrupt context only raises [`Trigger`]s (and arms the button latch);
//! [`Console::service`] then runs each raised handler to completion in
//! priority order, falling back to one main-loop pass when idle.

use portable_atomic::{AtomicU8, Ordering};
use crate::controller::ButtonLatch;
use crate::fsm::GameFsm;
use crate::hal::{MillisClock, PongHal};
use crate::types::{Button, GameConfig, SystemMode};

/// Handler sources, highest priority first
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    AnimationTick,
    SpecialEdge,
    RightEdge,
    LeftEdge,
    MillisTick,
}

impl Trigger {
    /// Every trigger, in priority order
    pub const ALL: [Trigger; 5] = [
        Trigger::AnimationTick,
        Trigger::SpecialEdge,
        Trigger::RightEdge,
        Trigger::LeftEdge,
        Trigger::MillisTick,
    ];

    const fn bit(&self) -> u8 {
        1 << (*self as u8)
    }

    /// Edge trigger for a button
    pub const fn edge(button: Button) -> Trigger {
        match button {
            Button::Special => Trigger::SpecialEdge,
            Button::Right => Trigger::RightEdge,
            Button::Left => Trigger::LeftEdge,
        }
    }
}

/// Set of raised triggers. Raising an already raised trigger coalesces.
pub struct PendingTriggers {
    bits: AtomicU8,
}

impl PendingTriggers {
    pub const fn new() -> Self {
        Self { bits: AtomicU8::new(0) }
    }

    /// Raise a trigger (called from interrupt handler)
    pub fn raise(&self, trigger: Trigger) {
        self.bits.fetch_or(trigger.bit(), Ordering::Release);
    }

    pub fn is_raised(&self, trigger: Trigger) -> bool {
        self.bits.load(Ordering::Acquire) & trigger.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.bits.load(Ordering::Acquire) == 0
    }

    /// Lower and return the highest-priority raised trigger
    pub fn take_highest(&self) -> Option<Trigger> {
        for trigger in Trigger::ALL {
            let bit = trigger.bit();
            if self.bits.fetch_and(!bit, Ordering::AcqRel) & bit != 0 {
                return Some(trigger);
            }
        }
        None
    }
}

impl Default for PendingTriggers {
    fn default() -> Self {
        Self::new()
    }
}

/// The whole console: game state, board drivers and the shared
/// interrupt-side cells.
pub struct Console<'a, H: PongHal> {
    fsm: GameFsm,
    hal: H,
    latch: &'a ButtonLatch,
    pending: &'a PendingTriggers,
}

impl<'a, H: PongHal> Console<'a, H> {
    pub fn new(config: GameConfig, hal: H, latch: &'a ButtonLatch, pending: &'a PendingTriggers) -> Self {
        info!("pong console up, serve from cell {}", config.default_position);
        Self {
            fsm: GameFsm::new(config),
            hal,
            latch,
            pending,
        }
    }

    /// Animation timer interrupt
    pub fn on_animation_tick(&mut self) {
        self.fsm.animate(self.hal.indicators());
    }

    /// 1 ms tick interrupt
    pub fn on_millis_tick(&mut self) {
        let now = self.hal.clock().now();
        self.fsm.refresh_hitzones(&mut self.hal, now);
    }

    /// Button edge interrupt: arm the latch, nothing else.
    /// Returns true if the edge started a debounce window.
    pub fn on_button_edge(&self, button: Button) -> bool {
        self.latch.on_edge(button, self.hal.clock().now())
    }

    /// One main-loop pass: drive the current mode, then dispatch a press
    /// whose debounce window has closed.
    pub fn run_main_loop_once(&mut self) {
        let now = self.hal.clock().now();
        match self.fsm.mode() {
            SystemMode::PlayMode => self.fsm.advance(&mut self.hal, now),
            SystemMode::MoveMode => self.fsm.refresh_placement(&mut self.hal),
        }

        if let Some(button) = self.latch.poll(now, self.fsm.config().debounce) {
            debug!("dispatch {:?}", button);
            self.fsm.dispatch(button, &mut self.hal, now);
        }
    }

    /// Run the highest-priority raised handler, or one main-loop pass if
    /// nothing is raised. Returns the trigger that was handled.
    pub fn service(&mut self) -> Option<Trigger> {
        let trigger = self.pending.take_highest();
        match trigger {
            Some(Trigger::AnimationTick) => self.on_animation_tick(),
            Some(Trigger::SpecialEdge) => {
                self.on_button_edge(Button::Special);
            }
            Some(Trigger::RightEdge) => {
                self.on_button_edge(Button::Right);
            }
            Some(Trigger::LeftEdge) => {
                self.on_button_edge(Button::Left);
            }
            Some(Trigger::MillisTick) => self.on_millis_tick(),
            None => self.run_main_loop_once(),
        }
        trigger
    }

    /// Drain every raised trigger, then run one main-loop pass
    pub fn service_all(&mut self) {
        while self.service().is_some() {}
    }

    pub fn fsm(&self) -> &GameFsm {
        &self.fsm
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }

    pub fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }

    pub fn latch(&self) -> &ButtonLatch {
        self.latch
    }
}
