//! Debounced button dispatch and the mode controller

use crate::fsm::GameFsm;
use crate::hal::{AnimationTimer, ButtonLines, IndicatorDriver, Instant, PongHal};
use crate::track;
use crate::types::{Button, Direction, GameState, Indicator, PlayerId, SystemMode};

impl GameFsm {
    /// Resolve a debounced press against the current mode and state.
    ///
    /// Paddle presses are dropped when their line is no longer held. The
    /// special button skips that line check and always toggles the mode;
    /// the reference board re-reads the special line first.
    pub fn dispatch<H: PongHal>(&mut self, button: Button, hal: &mut H, now: Instant) {
        let player = match button.player() {
            Some(player) => player,
            None => {
                self.toggle_mode(hal);
                return;
            }
        };

        if !hal.buttons().is_asserted(button) {
            trace!("{:?} released before debounce ended, dropped", button);
            return;
        }

        match self.mode {
            SystemMode::PlayMode => self.play_press(player, hal, now),
            SystemMode::MoveMode => self.nudge(player.button_direction(), hal),
        }
    }

    /// Paddle press during a rally: acknowledge it, then hit or miss.
    ///
    /// A hit retunes the animation timer to the incremented pace. The
    /// reference board retunes to the pace before the increment, so its
    /// speed-up lags one return behind.
    fn play_press<H: PongHal>(&mut self, player: PlayerId, hal: &mut H, now: Instant) {
        if !self.state.is_rally_over() {
            self.player_mut(player).press(now, hal.indicators());
        }

        if self.state == GameState::hitzone_of(player) && self.ball == player.hitzone_index() {
            self.pace += 1;
            hal.animation_timer().set_frequency(self.pace);
            self.direction = player.return_direction();
            debug!("{:?} returns the ball at {} Hz", player, self.pace);
            self.set_state(GameState::approaching(player.opponent()));
        } else if self.state == GameState::approaching(player) {
            debug!("{:?} swung early", player);
            self.handle_miss(player, hal, now);
        }
    }

    /// Move-mode placement step, wrapping within the game zone
    fn nudge<H: PongHal>(&mut self, direction: Direction, hal: &mut H) {
        let (to, vacated) = track::step_wrapping(self.ball, direction);
        hal.indicators().set(Indicator::Cell(vacated), false);
        self.ball = to;
        trace!("ball placed on cell {}", to);
    }

    /// Move-mode main-loop body: solid heartbeat, ball drawn, position
    /// remembered as the next serve start.
    pub fn refresh_placement<H: PongHal>(&mut self, hal: &mut H) {
        let indicators = hal.indicators();
        indicators.set(Indicator::Heartbeat, true);
        indicators.set(Indicator::Cell(self.ball), true);
        self.saved_position = self.ball;
    }

    /// Switch between play and move mode, resetting the match
    pub fn toggle_mode<H: PongHal>(&mut self, hal: &mut H) {
        if self.mode == SystemMode::MoveMode {
            self.saved_position = self.ball;
        }
        self.ball = self.saved_position;

        hal.animation_timer().stop();

        let indicators = hal.indicators();
        for player in self.players.iter_mut() {
            player.reset();
            player.clear_score_display(indicators);
            indicators.set(player.miss_light(), false);
        }
        indicators.clear_game_zone();
        for player in PlayerId::ALL {
            indicators.set(Indicator::Hitzone(player), true);
        }

        self.set_state(GameState::InitialServe);
        self.mode = self.mode.toggled();
        info!("mode {:?}, serve from cell {}", self.mode, self.saved_position);
    }
}

impl PlayerId {
    /// Which way this player's button nudges the ball in move mode
    pub const fn button_direction(&self) -> Direction {
        match self {
            PlayerId::First => Direction::Left,
            PlayerId::Second => Direction::Right,
        }
    }
}
