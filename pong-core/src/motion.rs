//! Ball motion, run once per animation tick

use crate::fsm::GameFsm;
use crate::hal::IndicatorDriver;
use crate::track;
use crate::types::{Indicator, SystemMode};

impl GameFsm {
    /// Animation tick handler.
    ///
    /// In a winners-circle state the winner's score display blinks and the
    /// ball stays put. Otherwise the heartbeat blinks and the ball takes
    /// one step; only game-zone cells are drawn, so the end cells keep
    /// showing hitzone and miss status while the ball passes over them.
    pub fn animate<I: IndicatorDriver>(&mut self, indicators: &mut I) {
        if self.mode == SystemMode::MoveMode {
            // Timer is stopped in move mode; a tick raised just before the
            // switch lands here.
            trace!("animation tick ignored in move mode");
            return;
        }

        if let Some(winner) = self.state.winner() {
            self.player(winner).toggle_score_display(indicators);
            return;
        }

        indicators.toggle(Indicator::Heartbeat);
        if track::in_game_zone(self.ball) {
            indicators.set(Indicator::Cell(self.ball), false);
        }
        self.ball = track::step(self.ball, self.direction);
        if track::in_game_zone(self.ball) {
            indicators.set(Indicator::Cell(self.ball), true);
        }
    }
}
