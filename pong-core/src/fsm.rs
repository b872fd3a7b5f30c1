//! Game state machine: serve, rally, scoring, timeouts and the winners circle

use crate::hal::{AnimationTimer, IndicatorDriver, Instant, PongHal};
use crate::player::Player;
use crate::track;
use crate::types::{Direction, GameConfig, GameState, Indicator, PlayerId, SystemMode};

/// Canonical game state shared by every interrupt context
pub struct GameFsm {
    pub(crate) state: GameState,
    pub(crate) mode: SystemMode,
    pub(crate) ball: u8,
    pub(crate) direction: Direction,
    pub(crate) pace: u32,
    pub(crate) saved_position: u8,
    pub(crate) players: [Player; 2],
    pub(crate) config: GameConfig,
}

impl GameFsm {
    /// Create FSM with given configuration, waiting to serve in play mode
    pub fn new(config: GameConfig) -> Self {
        Self {
            state: GameState::InitialServe,
            mode: SystemMode::PlayMode,
            ball: config.default_position,
            direction: Direction::Right,
            pace: config.default_pace,
            saved_position: config.default_position,
            players: [Player::new(PlayerId::First), Player::new(PlayerId::Second)],
            config,
        }
    }

    /// Get current FSM state
    pub fn current_state(&self) -> GameState {
        self.state
    }

    pub fn mode(&self) -> SystemMode {
        self.mode
    }

    /// Track index of the ball
    pub fn ball_position(&self) -> u8 {
        self.ball
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Animation rate in Hz
    pub fn pace(&self) -> u32 {
        self.pace
    }

    /// Where the next serve starts
    pub fn saved_position(&self) -> u8 {
        self.saved_position
    }

    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.slot()]
    }

    /// Get current configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> &mut Player {
        &mut self.players[id.slot()]
    }

    pub(crate) fn set_state(&mut self, next: GameState) {
        if next != self.state {
            debug!("game state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }

    /// One main-loop step of play mode. Motion itself happens on the
    /// animation tick; this only reacts to where the ball has got to.
    pub fn advance<H: PongHal>(&mut self, hal: &mut H, now: Instant) {
        match self.state {
            GameState::InitialServe => self.serve(hal),

            GameState::MoveRight => {
                if self.ball <= track::RIGHT_HITZONE {
                    self.set_state(GameState::RightHitzone);
                }
            }

            GameState::RightHitzone => {
                if self.ball <= track::RIGHT_MISS_ZONE {
                    self.handle_miss(PlayerId::Second, hal, now);
                }
            }

            GameState::MoveLeft => {
                if self.ball >= track::LEFT_HITZONE {
                    self.set_state(GameState::LeftHitzone);
                }
            }

            GameState::LeftHitzone => {
                if self.ball >= track::LEFT_MISS_ZONE {
                    self.handle_miss(PlayerId::First, hal, now);
                }
            }

            GameState::P1Lost => self.time_out(PlayerId::First, hal, now),
            GameState::P2Lost => self.time_out(PlayerId::Second, hal, now),

            GameState::P1WinnersCircle => self.in_winners_circle(PlayerId::First, hal, now),
            GameState::P2WinnersCircle => self.in_winners_circle(PlayerId::Second, hal, now),
        }
    }

    /// Put the ball on the saved position and send it toward the right
    /// player at the default pace.
    fn serve<H: PongHal>(&mut self, hal: &mut H) {
        self.ball = self.saved_position;
        self.pace = self.config.default_pace;
        hal.animation_timer().start_periodic(self.pace);
        self.direction = Direction::Right;
        info!("serve from cell {} at {} Hz", self.ball, self.pace);
        self.set_state(GameState::MoveRight);
    }

    /// Resolve a rally against `missing`. This is the only way into a lost
    /// or winners-circle state.
    pub fn handle_miss<H: PongHal>(&mut self, missing: PlayerId, hal: &mut H, now: Instant) {
        let opponent = missing.opponent();

        self.player_mut(missing).mark_miss(now, hal.indicators());
        self.update_score(missing, opponent, hal);
        self.saved_position = self.config.default_position;

        info!(
            "{:?} missed, score {}-{}",
            missing,
            self.player(PlayerId::First).score(),
            self.player(PlayerId::Second).score()
        );

        if self.player(opponent).is_winner() {
            self.set_up_winners_circle(opponent, hal, now);
            self.set_state(GameState::winners_circle(opponent));
        } else {
            self.set_state(GameState::lost(missing));
        }
    }

    /// Zero the loser's score and give the winner a point. Reaching the
    /// winning score raises the winner flag; acting on it is left to the
    /// caller.
    pub fn update_score<H: PongHal>(&mut self, loser: PlayerId, winner: PlayerId, hal: &mut H) {
        self.player_mut(loser).reset_score(hal.indicators());
        self.player_mut(winner).award_point(hal.indicators());
    }

    /// Stamp the win and switch the animation timer to the score blink
    fn set_up_winners_circle<H: PongHal>(&mut self, winner: PlayerId, hal: &mut H, now: Instant) {
        self.player_mut(winner).mark_win(now);
        hal.indicators().clear_game_zone();
        let timer = hal.animation_timer();
        timer.stop();
        timer.start_periodic(self.config.winners_blink_hz);
        info!("{:?} wins the match", winner);
    }

    /// Hold the board dark after a miss, then serve again. Repeated calls
    /// before the timeout only re-assert the dark board.
    pub fn time_out<H: PongHal>(&mut self, player: PlayerId, hal: &mut H, now: Instant) {
        let indicators = hal.indicators();
        indicators.clear_game_zone();
        indicators.set(Indicator::Heartbeat, false);
        hal.animation_timer().stop();

        let elapsed = now.duration_since(self.player(player).miss_stamp());
        if elapsed >= self.config.time_out {
            self.player_mut(player).clear_miss(hal.indicators());
            self.set_state(GameState::InitialServe);
        }
    }

    /// Keep the winner's hitzone lit while the score display blinks, then
    /// reset the match and serve again.
    pub fn in_winners_circle<H: PongHal>(&mut self, winner: PlayerId, hal: &mut H, now: Instant) {
        let loser = winner.opponent();
        hal.indicators().set(Indicator::Hitzone(winner), true);

        let elapsed = now.duration_since(self.player(winner).win_stamp());
        if elapsed >= self.config.winners_circle {
            hal.animation_timer().stop();
            self.player_mut(winner).reset_score(hal.indicators());
            self.player_mut(loser).clear_miss(hal.indicators());
            self.player_mut(winner).clear_win();
            self.set_state(GameState::InitialServe);
        }
    }

    /// Millisecond tick: hitzone LED upkeep for both players (play mode only)
    pub fn refresh_hitzones<H: PongHal>(&mut self, hal: &mut H, now: Instant) {
        if self.mode != SystemMode::PlayMode {
            return;
        }
        let state = self.state;
        let toggle = self.config.hitzone_toggle;
        for player in self.players.iter_mut() {
            player.refresh_hitzone(state, now, toggle, hal.indicators());
        }
    }
}
