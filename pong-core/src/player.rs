//! Player model: score, flags and the indicators each player owns

use crate::hal::{Duration, IndicatorDriver, Instant};
use crate::types::{GameState, Indicator, PlayerId, WINNING_SCORE};

/// Per-player state
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Player {
    id: PlayerId,
    score: u8,
    pressed: bool,
    press_stamp: Instant,
    missed: bool,
    miss_stamp: Instant,
    winner: bool,
    win_stamp: Instant,
}

impl Player {
    /// Create a player with no points and all flags clear
    pub const fn new(id: PlayerId) -> Self {
        Self {
            id,
            score: 0,
            pressed: false,
            press_stamp: Instant::ZERO,
            missed: false,
            miss_stamp: Instant::ZERO,
            winner: false,
            win_stamp: Instant::ZERO,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn press_stamp(&self) -> Instant {
        self.press_stamp
    }

    pub fn has_missed(&self) -> bool {
        self.missed
    }

    pub fn miss_stamp(&self) -> Instant {
        self.miss_stamp
    }

    pub fn is_winner(&self) -> bool {
        self.winner
    }

    pub fn win_stamp(&self) -> Instant {
        self.win_stamp
    }

    pub fn hitzone(&self) -> Indicator {
        Indicator::Hitzone(self.id)
    }

    pub fn miss_light(&self) -> Indicator {
        Indicator::Miss(self.id)
    }

    /// Acknowledge a press: the hitzone LED goes dark until the re-arm
    /// interval has passed.
    pub fn press<I: IndicatorDriver>(&mut self, now: Instant, indicators: &mut I) {
        self.pressed = true;
        self.press_stamp = now;
        indicators.set(self.hitzone(), false);
    }

    /// Record a missed ball and light the miss LED
    pub fn mark_miss<I: IndicatorDriver>(&mut self, now: Instant, indicators: &mut I) {
        indicators.set(self.hitzone(), false);
        self.miss_stamp = now;
        self.missed = true;
        indicators.set(self.miss_light(), true);
    }

    /// Clear the miss flag, its timestamp and the miss LED
    pub fn clear_miss<I: IndicatorDriver>(&mut self, indicators: &mut I) {
        self.missed = false;
        self.miss_stamp = Instant::ZERO;
        indicators.set(self.miss_light(), false);
    }

    /// Lose every point and blank the score display
    pub fn reset_score<I: IndicatorDriver>(&mut self, indicators: &mut I) {
        self.score = 0;
        self.clear_score_display(indicators);
    }

    /// Add one point and show it. Returns true when this point wins the
    /// match, which also raises the winner flag.
    pub fn award_point<I: IndicatorDriver>(&mut self, indicators: &mut I) -> bool {
        if self.score < WINNING_SCORE {
            self.score += 1;
        }
        if self.score == WINNING_SCORE {
            self.winner = true;
        }
        self.show_score(indicators);
        self.winner
    }

    /// Start the winners-circle clock
    pub fn mark_win(&mut self, now: Instant) {
        self.win_stamp = now;
    }

    /// Leave the winners circle: winner flag and timestamp cleared
    pub fn clear_win(&mut self) {
        self.winner = false;
        self.win_stamp = Instant::ZERO;
    }

    /// Clear every flag and timestamp and zero the score, without touching
    /// the LEDs
    pub fn reset(&mut self) {
        *self = Player::new(self.id);
    }

    /// Force the score (test setup only). Display and flags are untouched.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn set_score(&mut self, score: u8) {
        self.score = score.min(WINNING_SCORE);
    }

    /// Light one score LED per point
    pub fn show_score<I: IndicatorDriver>(&self, indicators: &mut I) {
        for slot in 0..self.score.min(WINNING_SCORE) {
            indicators.set(Indicator::Score(self.id, slot), true);
        }
    }

    pub fn clear_score_display<I: IndicatorDriver>(&self, indicators: &mut I) {
        for slot in 0..WINNING_SCORE {
            indicators.set(Indicator::Score(self.id, slot), false);
        }
    }

    /// Invert all three score LEDs (winners-circle blink)
    pub fn toggle_score_display<I: IndicatorDriver>(&self, indicators: &mut I) {
        for slot in 0..WINNING_SCORE {
            indicators.toggle(Indicator::Score(self.id, slot));
        }
    }

    /// Millisecond-tick upkeep of the hitzone LED.
    ///
    /// While the player is neither mid-press nor has missed, and the rally
    /// is still live, the LED is forced on every tick so it heals from any
    /// stray write. A press keeps it dark for `toggle_interval`, after which
    /// the press is forgotten and the next tick relights it.
    pub fn refresh_hitzone<I: IndicatorDriver>(
        &mut self,
        state: GameState,
        now: Instant,
        toggle_interval: Duration,
        indicators: &mut I,
    ) {
        if !self.pressed && !self.missed && !state.is_rally_over() {
            indicators.set(self.hitzone(), true);
        } else if self.pressed && now.duration_since(self.press_stamp) >= toggle_interval {
            self.press_stamp = Instant::ZERO;
            self.pressed = false;
        }
    }
}
