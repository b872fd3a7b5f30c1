//! Hardware Abstraction Layer for the pong board

pub use self::time::{Duration, Instant};

mod time {
    /// Millisecond timestamp read from the board tick counter.
    /// Wraps after ~49 days; differences use wrapping arithmetic.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
    #[cfg_attr(feature = "std", derive(Hash))]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Instant(u32);

    impl Instant {
        pub const ZERO: Instant = Instant(0);

        pub const fn from_millis(ms: u32) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u32 {
            self.0
        }

        /// Time elapsed since `earlier`, correct across counter wraparound
        pub const fn duration_since(&self, earlier: Instant) -> Duration {
            Duration::from_millis(self.0.wrapping_sub(earlier.0))
        }
    }

    impl core::ops::Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            Instant(self.0.wrapping_add(rhs.as_millis()))
        }
    }

    /// Millisecond duration
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Default)]
    #[cfg_attr(feature = "std", derive(Hash))]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Duration(u32);

    impl Duration {
        pub const ZERO: Duration = Duration(0);

        pub const fn from_millis(ms: u32) -> Self {
            Self(ms)
        }

        pub const fn as_millis(&self) -> u32 {
            self.0
        }
    }

    impl core::ops::Div<u32> for Duration {
        type Output = Duration;

        fn div(self, rhs: u32) -> Duration {
            Duration(self.0 / rhs)
        }
    }

    impl core::ops::Mul<u32> for Duration {
        type Output = Duration;

        fn mul(self, rhs: u32) -> Duration {
            Duration(self.0.saturating_mul(rhs))
        }
    }

    impl core::ops::Add for Duration {
        type Output = Duration;

        fn add(self, rhs: Duration) -> Duration {
            Duration(self.0.saturating_add(rhs.0))
        }
    }
}

use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;
use crate::track;
use crate::types::{Button, Indicator};

/// Trait for driving the board LEDs. Writes cannot fail from the game's
/// point of view.
pub trait IndicatorDriver {
    /// Switch an indicator on or off
    fn set(&mut self, indicator: Indicator, on: bool);

    /// Invert an indicator
    fn toggle(&mut self, indicator: Indicator);

    /// Switch off every game-zone cell
    fn clear_game_zone(&mut self) {
        for cell in track::GAME_ZONE_START..=track::GAME_ZONE_END {
            self.set(Indicator::Cell(cell), false);
        }
    }
}

/// Trait for the periodic timer behind the animation tick
pub trait AnimationTimer {
    /// Arm the timer at `hz` and start it
    fn start_periodic(&mut self, hz: u32);

    /// Stop the timer; no further ticks until restarted
    fn stop(&mut self);

    /// Change the rate, restarting the current period
    fn set_frequency(&mut self, hz: u32);
}

/// Trait for the free-running millisecond counter
pub trait MillisClock {
    /// Current time
    fn now(&self) -> Instant;
}

/// Trait for re-reading the raw button lines
pub trait ButtonLines {
    /// Returns true while the button is physically held
    fn is_asserted(&mut self, button: Button) -> bool;
}

/// Complete pong board interface
pub trait PongHal {
    type Indicators: IndicatorDriver;
    type Timer: AnimationTimer;
    type Clock: MillisClock;
    type Buttons: ButtonLines;

    /// Access to the LED bank
    fn indicators(&mut self) -> &mut Self::Indicators;

    /// Access to the animation timer
    fn animation_timer(&mut self) -> &mut Self::Timer;

    /// Access to the millisecond clock
    fn clock(&self) -> &Self::Clock;

    /// Access to the button lines
    fn buttons(&mut self) -> &mut Self::Buttons;
}

/// Indicator bank over embedded-hal output pins, one pin per
/// [`Indicator::index`]. Pins beyond the ones supplied are treated as not
/// fitted and ignored.
pub struct EmbeddedHalIndicators<P> {
    pins: Vec<P, { Indicator::COUNT }>,
    lit: u32,
    active_low: bool,
}

impl<P> EmbeddedHalIndicators<P>
where
    P: OutputPin,
{
    /// Build the bank from pins in index order. Extra pins are dropped.
    pub fn new<I>(pins: I, active_low: bool) -> Self
    where
        I: IntoIterator<Item = P>,
    {
        let mut bank = Vec::new();
        for pin in pins {
            if bank.push(pin).is_err() {
                break;
            }
        }
        Self { pins: bank, lit: 0, active_low }
    }

    /// Number of fitted pins
    pub fn fitted(&self) -> usize {
        self.pins.len()
    }

    /// Last commanded state of an indicator
    pub fn is_lit(&self, indicator: Indicator) -> bool {
        match indicator.index() {
            Some(index) => self.lit & (1 << index) != 0,
            None => false,
        }
    }

    fn write(&mut self, index: usize, on: bool) {
        if let Some(pin) = self.pins.get_mut(index) {
            let level = on != self.active_low;
            // A failed write leaves the shadow bit in charge; the next
            // refresh of that indicator retries it.
            if level {
                pin.set_high().ok();
            } else {
                pin.set_low().ok();
            }
        }
        if on {
            self.lit |= 1 << index;
        } else {
            self.lit &= !(1 << index);
        }
    }
}

impl<P> IndicatorDriver for EmbeddedHalIndicators<P>
where
    P: OutputPin,
{
    fn set(&mut self, indicator: Indicator, on: bool) {
        if let Some(index) = indicator.index() {
            self.write(index, on);
        }
    }

    fn toggle(&mut self, indicator: Indicator) {
        if let Some(index) = indicator.index() {
            let on = self.lit & (1 << index) == 0;
            self.write(index, on);
        }
    }
}

/// Active-low button lines over embedded-hal input pins (pulled up,
/// grounded when pressed)
pub struct EmbeddedHalButtons<L, R, S> {
    left: L,
    right: R,
    special: S,
}

impl<L, R, S> EmbeddedHalButtons<L, R, S>
where
    L: InputPin,
    R: InputPin,
    S: InputPin,
{
    pub fn new(left: L, right: R, special: S) -> Self {
        Self { left, right, special }
    }
}

impl<L, R, S> ButtonLines for EmbeddedHalButtons<L, R, S>
where
    L: InputPin,
    R: InputPin,
    S: InputPin,
{
    fn is_asserted(&mut self, button: Button) -> bool {
        // An unreadable line counts as released, which drops the event
        match button {
            Button::Left => self.left.is_low().unwrap_or(false),
            Button::Right => self.right.is_low().unwrap_or(false),
            Button::Special => self.special.is_low().unwrap_or(false),
        }
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock implementations for testing

    use super::*;
    use heapless::Deque;

    /// Indicator bank that remembers every write
    #[derive(Debug, Default)]
    pub struct MockIndicators {
        lit: [bool; Indicator::COUNT],
        writes: usize,
        recent: Deque<(Indicator, bool), 64>,
    }

    impl MockIndicators {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_lit(&self, indicator: Indicator) -> bool {
            indicator.index().map(|i| self.lit[i]).unwrap_or(false)
        }

        /// Game-zone cells currently lit
        pub fn lit_game_cells(&self) -> Vec<u8, { Indicator::COUNT }> {
            let mut cells = Vec::new();
            for cell in track::GAME_ZONE_START..=track::GAME_ZONE_END {
                if self.is_lit(Indicator::Cell(cell)) {
                    cells.push(cell).ok();
                }
            }
            cells
        }

        /// Number of score LEDs lit for a player
        pub fn score_lights(&self, player: crate::types::PlayerId) -> u8 {
            (0..crate::types::WINNING_SCORE)
                .filter(|slot| self.is_lit(Indicator::Score(player, *slot)))
                .count() as u8
        }

        /// Total writes since creation
        pub fn write_count(&self) -> usize {
            self.writes
        }

        /// Most recent writes, oldest first
        pub fn recent(&self) -> impl Iterator<Item = &(Indicator, bool)> {
            self.recent.iter()
        }

        fn record(&mut self, indicator: Indicator, on: bool) {
            self.writes += 1;
            if self.recent.is_full() {
                self.recent.pop_front();
            }
            self.recent.push_back((indicator, on)).ok();
        }
    }

    impl IndicatorDriver for MockIndicators {
        fn set(&mut self, indicator: Indicator, on: bool) {
            if let Some(index) = indicator.index() {
                self.lit[index] = on;
                self.record(indicator, on);
            }
        }

        fn toggle(&mut self, indicator: Indicator) {
            if let Some(index) = indicator.index() {
                let on = !self.lit[index];
                self.lit[index] = on;
                self.record(indicator, on);
            }
        }
    }

    /// Animation timer that only records commands
    #[derive(Debug, Default)]
    pub struct MockAnimationTimer {
        running: bool,
        frequency: u32,
        starts: u32,
        stops: u32,
    }

    impl MockAnimationTimer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_running(&self) -> bool {
            self.running
        }

        /// Armed frequency in Hz (kept while stopped)
        pub fn frequency(&self) -> u32 {
            self.frequency
        }

        pub fn start_count(&self) -> u32 {
            self.starts
        }

        pub fn stop_count(&self) -> u32 {
            self.stops
        }
    }

    impl AnimationTimer for MockAnimationTimer {
        fn start_periodic(&mut self, hz: u32) {
            self.frequency = hz;
            self.running = true;
            self.starts += 1;
        }

        fn stop(&mut self) {
            self.running = false;
            self.stops += 1;
        }

        fn set_frequency(&mut self, hz: u32) {
            self.frequency = hz;
        }
    }

    /// Hand-wound millisecond clock
    #[derive(Debug, Default)]
    pub struct MockClock {
        now: Instant,
    }

    impl MockClock {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn starting_at(ms: u32) -> Self {
            Self { now: Instant::from_millis(ms) }
        }

        pub fn set(&mut self, now: Instant) {
            self.now = now;
        }

        pub fn advance(&mut self, by: Duration) {
            self.now = self.now + by;
        }
    }

    impl MillisClock for MockClock {
        fn now(&self) -> Instant {
            self.now
        }
    }

    /// Button lines set by the test
    #[derive(Debug, Default)]
    pub struct MockButtons {
        held: [bool; 3],
    }

    impl MockButtons {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_held(&mut self, button: Button, held: bool) {
            self.held[(button.to_raw() - 1) as usize] = held;
        }

        pub fn release_all(&mut self) {
            self.held = [false; 3];
        }
    }

    impl ButtonLines for MockButtons {
        fn is_asserted(&mut self, button: Button) -> bool {
            self.held[(button.to_raw() - 1) as usize]
        }
    }

    /// Mock board collection
    #[derive(Debug, Default)]
    pub struct MockBoard {
        pub indicators: MockIndicators,
        pub timer: MockAnimationTimer,
        pub clock: MockClock,
        pub buttons: MockButtons,
    }

    impl MockBoard {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl PongHal for MockBoard {
        type Indicators = MockIndicators;
        type Timer = MockAnimationTimer;
        type Clock = MockClock;
        type Buttons = MockButtons;

        fn indicators(&mut self) -> &mut MockIndicators {
            &mut self.indicators
        }

        fn animation_timer(&mut self) -> &mut MockAnimationTimer {
            &mut self.timer
        }

        fn clock(&self) -> &MockClock {
            &self.clock
        }

        fn buttons(&mut self) -> &mut MockButtons {
            &mut self.buttons
        }
    }
}
