#![no_std]

//! Firmware library: embassy-backed board drivers, the shared console and
//! the async loops the binary spawns. Everything except the CH32V203
//! register layer builds and tests on the host.

pub use pong_core::*;

pub use crate::drivers::*;
pub use crate::shared::SharedConsole;
pub use crate::tasks::*;

#[cfg(feature = "defmt")]
macro_rules! log_info {
    ($($arg:tt)*) => { defmt::info!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{}};
}

// Embassy-backed clock and animation timer
pub mod drivers {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::signal::Signal;
    use pong_core::hal::{AnimationTimer, Instant, MillisClock};

    /// Millisecond clock over the embassy time driver
    #[derive(Debug, Default, Clone, Copy)]
    pub struct EmbassyClock;

    impl MillisClock for EmbassyClock {
        fn now(&self) -> Instant {
            // Truncation wraps the same way the core expects
            Instant::from_millis(embassy_time::Instant::now().as_millis() as u32)
        }
    }

    /// Command to the animation timer task
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum TimerCommand {
        /// Run at the given rate, phase restarted
        Start(u32),
        /// Change rate, phase restarted
        Retune(u32),
        Stop,
    }

    impl TimerCommand {
        /// Tick period the command asks for, `None` when stopped
        pub fn period(&self) -> Option<embassy_time::Duration> {
            match *self {
                TimerCommand::Start(hz) | TimerCommand::Retune(hz) => {
                    Some(embassy_time::Duration::from_hz(u64::from(hz.max(1))))
                }
                TimerCommand::Stop => None,
            }
        }
    }

    /// Channel between the console and the animation timer task
    pub type TimerSignal = Signal<CriticalSectionRawMutex, TimerCommand>;

    /// Animation timer that forwards commands to [`crate::tasks::animation_timer_loop`].
    /// Only the latest command is kept; it is the one that describes the
    /// timer's intended state.
    pub struct SignalAnimationTimer {
        commands: &'static TimerSignal,
    }

    impl SignalAnimationTimer {
        pub const fn new(commands: &'static TimerSignal) -> Self {
            Self { commands }
        }
    }

    impl AnimationTimer for SignalAnimationTimer {
        fn start_periodic(&mut self, hz: u32) {
            self.commands.signal(TimerCommand::Start(hz));
        }

        fn stop(&mut self) {
            self.commands.signal(TimerCommand::Stop);
        }

        fn set_frequency(&mut self, hz: u32) {
            self.commands.signal(TimerCommand::Retune(hz));
        }
    }
}

// Console shared between the console task and whoever installs it
pub mod shared {
    use core::cell::RefCell;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_sync::blocking_mutex::Mutex;
    use pong_core::{Console, PongHal};

    /// Statically allocated slot for the console
    pub struct SharedConsole<H: PongHal + 'static> {
        inner: Mutex<CriticalSectionRawMutex, RefCell<Option<Console<'static, H>>>>,
    }

    impl<H: PongHal + 'static> SharedConsole<H> {
        pub const fn new() -> Self {
            Self {
                inner: Mutex::new(RefCell::new(None)),
            }
        }

        /// Put the console in place, replacing any previous one
        pub fn install(&self, console: Console<'static, H>) {
            self.inner.lock(|cell| {
                cell.replace(Some(console));
            });
        }

        /// Run `f` on the console inside a critical section.
        /// Returns `None` until a console is installed.
        pub fn with<R>(&self, f: impl FnOnce(&mut Console<'static, H>) -> R) -> Option<R> {
            self.inner.lock(|cell| cell.borrow_mut().as_mut().map(f))
        }

        pub fn is_installed(&self) -> bool {
            self.inner.lock(|cell| cell.borrow().is_some())
        }
    }
}

// Async loops spawned as embassy tasks by the binary
pub mod tasks {
    use embassy_futures::select::{select, Either};
    use embassy_futures::yield_now;
    use embassy_time::Timer;
    use pong_core::{PendingTriggers, PongHal, Trigger};

    use crate::drivers::TimerSignal;
    use crate::shared::SharedConsole;

    /// Animation timer: raises an animation tick every period until told
    /// otherwise. Every command restarts the phase.
    pub async fn animation_timer_loop(commands: &TimerSignal, pending: &PendingTriggers) -> ! {
        log_info!("animation timer task started");
        let mut period = None;

        loop {
            period = match period {
                None => commands.wait().await.period(),
                Some(every) => match select(Timer::after(every), commands.wait()).await {
                    Either::First(()) => {
                        pending.raise(Trigger::AnimationTick);
                        Some(every)
                    }
                    Either::Second(command) => command.period(),
                },
            };
        }
    }

    /// Console loop: drain raised triggers in priority order, run one
    /// main-loop pass, then let the other tasks in.
    pub async fn console_loop<H: PongHal + 'static>(console: &SharedConsole<H>) -> ! {
        log_info!("console task started");
        loop {
            console.with(|console| console.service_all());
            yield_now().await;
        }
    }

    /// Millisecond interrupt body
    pub fn on_millis_interrupt(pending: &PendingTriggers) {
        pending.raise(Trigger::MillisTick);
    }
}


#[cfg(feature = "riscv")]
pub mod board;

#[cfg(feature = "riscv")]
pub mod time_driver;
