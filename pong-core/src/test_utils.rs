//! Test utilities for driving a whole console on the host

pub mod simulator {
    //! Millisecond-stepped simulation of the board interrupts

    use std::vec::Vec;
    use crate::controller::ButtonLatch;
    use crate::fsm::GameFsm;
    use crate::hal::mock::MockBoard;
    use crate::hal::{Duration, Instant, MillisClock};
    use crate::scheduler::{Console, PendingTriggers, Trigger};
    use crate::types::{Button, GameConfig, GameState};

    /// Scheduled button hold, edge at `at`, line released at `release_at`
    #[derive(Debug, Clone, Copy)]
    pub struct ButtonHold {
        pub button: Button,
        pub at: Instant,
        pub release_at: Instant,
    }

    /// Default time a simulated finger stays on a button
    pub const DEFAULT_HOLD: Duration = Duration::from_millis(40);

    /// Virtual-time console harness.
    ///
    /// Every simulated millisecond raises the 1 ms tick, raises an
    /// animation tick whenever the armed timer period has elapsed, applies
    /// scheduled button edges, and then services the console until it
    /// falls through to one main-loop pass.
    pub struct Simulator {
        console: Console<'static, MockBoard>,
        pending: &'static PendingTriggers,
        holds: Vec<ButtonHold>,
        next_animation: Option<Instant>,
        seen_starts: u32,
        seen_frequency: u32,
        animation_ticks: u32,
    }

    impl Simulator {
        pub fn new(config: GameConfig) -> Self {
            Self::with_board(config, MockBoard::new())
        }

        pub fn with_board(config: GameConfig, board: MockBoard) -> Self {
            let latch: &'static ButtonLatch = Box::leak(Box::new(ButtonLatch::new()));
            let pending: &'static PendingTriggers = Box::leak(Box::new(PendingTriggers::new()));
            Self {
                console: Console::new(config, board, latch, pending),
                pending,
                holds: Vec::new(),
                next_animation: None,
                seen_starts: 0,
                seen_frequency: 0,
                animation_ticks: 0,
            }
        }

        /// Current virtual time
        pub fn now(&self) -> Instant {
            self.console.hal().clock.now()
        }

        pub fn fsm(&self) -> &GameFsm {
            self.console.fsm()
        }

        pub fn board(&self) -> &MockBoard {
            self.console.hal()
        }

        pub fn state(&self) -> GameState {
            self.console.fsm().current_state()
        }

        /// Animation ticks delivered so far
        pub fn animation_ticks(&self) -> u32 {
            self.animation_ticks
        }

        /// Press `button` `delay` from now and hold it for `hold`
        pub fn press_after(&mut self, delay: Duration, button: Button, hold: Duration) {
            let at = self.now() + delay;
            self.holds.push(ButtonHold { button, at, release_at: at + hold });
        }

        /// Press `button` on the next millisecond with the default hold
        pub fn press(&mut self, button: Button) {
            self.press_after(Duration::from_millis(1), button, DEFAULT_HOLD);
        }

        /// Press `button` and let go before the debounce window closes
        pub fn tap(&mut self, button: Button) {
            let short = self.fsm().config().debounce / 2;
            self.press_after(Duration::from_millis(1), button, short);
        }

        /// Advance one millisecond
        pub fn step(&mut self) {
            self.console.hal_mut().clock.advance(Duration::from_millis(1));
            let now = self.now();

            self.pending.raise(Trigger::MillisTick);

            if let Some(due) = self.next_animation {
                if now.duration_since(due).as_millis() < u32::MAX / 2 {
                    self.pending.raise(Trigger::AnimationTick);
                    self.animation_ticks += 1;
                    self.next_animation = Some(due + GameConfig::tick_period(self.seen_frequency));
                }
            }

            let buttons = &mut self.console.hal_mut().buttons;
            for hold in self.holds.iter() {
                if hold.at == now {
                    buttons.set_held(hold.button, true);
                    self.pending.raise(Trigger::edge(hold.button));
                }
                if hold.release_at == now {
                    buttons.set_held(hold.button, false);
                }
            }
            self.holds.retain(|hold| hold.release_at != now);

            self.console.service_all();
            self.track_timer(now);
        }

        /// Advance by `duration`
        pub fn run_for(&mut self, duration: Duration) {
            for _ in 0..duration.as_millis() {
                self.step();
            }
        }

        /// Step until `done` holds or `limit` has passed.
        /// Returns true if the condition was met.
        pub fn run_until<F>(&mut self, limit: Duration, mut done: F) -> bool
        where
            F: FnMut(&Simulator) -> bool,
        {
            for _ in 0..limit.as_millis() {
                if done(self) {
                    return true;
                }
                self.step();
            }
            done(self)
        }

        /// Follow the mock timer: a restart or a new rate resets the phase
        fn track_timer(&mut self, now: Instant) {
            let timer = &self.console.hal().timer;
            if !timer.is_running() {
                self.next_animation = None;
                self.seen_starts = timer.start_count();
                return;
            }

            let restarted = timer.start_count() != self.seen_starts;
            let retuned = timer.frequency() != self.seen_frequency;
            if restarted || retuned || self.next_animation.is_none() {
                self.seen_starts = timer.start_count();
                self.seen_frequency = timer.frequency();
                self.next_animation = Some(now + GameConfig::tick_period(self.seen_frequency));
            }
        }
    }

    impl Default for Simulator {
        fn default() -> Self {
            Self::new(GameConfig::default())
        }
    }
}

pub use simulator::Simulator;
