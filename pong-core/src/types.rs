//! Core data types for the pong game

use crate::hal::Duration;
use crate::track;

/// Player identity. The first player stands at the left end of the strip
/// (high indices), the second at the right end (low indices).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerId {
    /// Left player, "P1"
    First,
    /// Right player, "P2"
    Second,
}

impl PlayerId {
    /// Both players, in slot order
    pub const ALL: [PlayerId; 2] = [PlayerId::First, PlayerId::Second];

    /// Returns the other player
    pub const fn opponent(&self) -> PlayerId {
        match self {
            PlayerId::First => PlayerId::Second,
            PlayerId::Second => PlayerId::First,
        }
    }

    /// Slot of this player in a two-element array
    pub const fn slot(&self) -> usize {
        match self {
            PlayerId::First => 0,
            PlayerId::Second => 1,
        }
    }

    /// The button this player presses
    pub const fn button(&self) -> Button {
        match self {
            PlayerId::First => Button::Left,
            PlayerId::Second => Button::Right,
        }
    }

    /// Track index of this player's hitzone cell
    pub const fn hitzone_index(&self) -> u8 {
        match self {
            PlayerId::First => track::LEFT_HITZONE,
            PlayerId::Second => track::RIGHT_HITZONE,
        }
    }

    /// Track index of this player's miss cell
    pub const fn miss_index(&self) -> u8 {
        match self {
            PlayerId::First => track::LEFT_MISS_ZONE,
            PlayerId::Second => track::RIGHT_MISS_ZONE,
        }
    }

    /// Direction the ball travels after this player returns it
    pub const fn return_direction(&self) -> Direction {
        match self {
            PlayerId::First => Direction::Right,
            PlayerId::Second => Direction::Left,
        }
    }
}

/// Physical buttons
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    /// Left paddle (first player)
    Left,
    /// Right paddle (second player)
    Right,
    /// Board button, toggles the system mode
    Special,
}

impl Button {
    /// Player owning this button, `None` for the special button
    pub const fn player(&self) -> Option<PlayerId> {
        match self {
            Button::Left => Some(PlayerId::First),
            Button::Right => Some(PlayerId::Second),
            Button::Special => None,
        }
    }

    /// Compact encoding used by the atomic latch
    pub const fn to_raw(&self) -> u8 {
        match self {
            Button::Left => 1,
            Button::Right => 2,
            Button::Special => 3,
        }
    }

    /// Inverse of [`Button::to_raw`]
    pub const fn from_raw(raw: u8) -> Option<Button> {
        match raw {
            1 => Some(Button::Left),
            2 => Some(Button::Right),
            3 => Some(Button::Special),
            _ => None,
        }
    }
}

/// Ball travel direction. `Left` walks up the track indices, `Right` down.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Returns the opposite direction
    pub const fn reversed(&self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// System operating modes
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemMode {
    /// Normal rally play
    PlayMode,
    /// Manual placement of the serve position
    MoveMode,
}

impl SystemMode {
    /// Returns the other mode
    pub const fn toggled(&self) -> SystemMode {
        match self {
            SystemMode::PlayMode => SystemMode::MoveMode,
            SystemMode::MoveMode => SystemMode::PlayMode,
        }
    }
}

/// Game FSM states
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameState {
    /// Serve pending, ball placed on the next `advance`
    InitialServe,
    /// Ball travelling toward the right player
    MoveRight,
    /// Ball in the right player's hitzone
    RightHitzone,
    /// Ball travelling toward the left player
    MoveLeft,
    /// Ball in the left player's hitzone
    LeftHitzone,
    /// Left player missed, timeout running
    P1Lost,
    /// Right player missed, timeout running
    P2Lost,
    /// Left player won the match
    P1WinnersCircle,
    /// Right player won the match
    P2WinnersCircle,
}

impl GameState {
    /// Every state, in declaration order
    pub const ALL: [GameState; 9] = [
        GameState::InitialServe,
        GameState::MoveRight,
        GameState::RightHitzone,
        GameState::MoveLeft,
        GameState::LeftHitzone,
        GameState::P1Lost,
        GameState::P2Lost,
        GameState::P1WinnersCircle,
        GameState::P2WinnersCircle,
    ];

    /// Returns true once the rally has been decided (lost or winners circle).
    /// Presses are not acknowledged in these states.
    pub const fn is_rally_over(&self) -> bool {
        match self {
            GameState::P1Lost
            | GameState::P2Lost
            | GameState::P1WinnersCircle
            | GameState::P2WinnersCircle => true,
            GameState::InitialServe
            | GameState::MoveRight
            | GameState::RightHitzone
            | GameState::MoveLeft
            | GameState::LeftHitzone => false,
        }
    }

    /// Hitzone state belonging to `player`
    pub const fn hitzone_of(player: PlayerId) -> GameState {
        match player {
            PlayerId::First => GameState::LeftHitzone,
            PlayerId::Second => GameState::RightHitzone,
        }
    }

    /// Motion state that carries the ball toward `player`
    pub const fn approaching(player: PlayerId) -> GameState {
        match player {
            PlayerId::First => GameState::MoveLeft,
            PlayerId::Second => GameState::MoveRight,
        }
    }

    /// Lost state for the player who missed
    pub const fn lost(player: PlayerId) -> GameState {
        match player {
            PlayerId::First => GameState::P1Lost,
            PlayerId::Second => GameState::P2Lost,
        }
    }

    /// Winners-circle state for the match winner
    pub const fn winners_circle(player: PlayerId) -> GameState {
        match player {
            PlayerId::First => GameState::P1WinnersCircle,
            PlayerId::Second => GameState::P2WinnersCircle,
        }
    }

    /// The winner, if this is a winners-circle state
    pub const fn winner(&self) -> Option<PlayerId> {
        match self {
            GameState::P1WinnersCircle => Some(PlayerId::First),
            GameState::P2WinnersCircle => Some(PlayerId::Second),
            _ => None,
        }
    }
}

/// Addressable indicators on the board
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "std", derive(Hash))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// A track cell by index. Game-zone cells are lit by the ball;
    /// the end cells double as hitzone and miss indicators.
    Cell(u8),
    /// The player's hitzone LED
    Hitzone(PlayerId),
    /// The player's miss LED
    Miss(PlayerId),
    /// One of the player's three score LEDs
    Score(PlayerId, u8),
    /// Board LED: blinks while playing, solid in move mode
    Heartbeat,
}

impl Indicator {
    /// Number of distinct indicators
    pub const COUNT: usize = track::TRACK_LEN as usize + 2 * WINNING_SCORE as usize + 1;

    /// Flat index into an indicator bank, or `None` for an out-of-range cell
    /// or score slot.
    pub const fn index(&self) -> Option<usize> {
        match *self {
            Indicator::Cell(cell) if cell < track::TRACK_LEN => Some(cell as usize),
            Indicator::Cell(_) => None,
            Indicator::Hitzone(player) => Some(player.hitzone_index() as usize),
            Indicator::Miss(player) => Some(player.miss_index() as usize),
            Indicator::Score(player, slot) if slot < WINNING_SCORE => {
                Some(track::TRACK_LEN as usize + player.slot() * WINNING_SCORE as usize + slot as usize)
            }
            Indicator::Score(_, _) => None,
            Indicator::Heartbeat => Some(Self::COUNT - 1),
        }
    }
}

/// Points needed to win the match
pub const WINNING_SCORE: u8 = 3;

/// Game timing and placement parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GameConfig {
    /// Time a button edge must settle before dispatch
    pub debounce: Duration,
    /// How long a hitzone LED stays dark after a press
    pub hitzone_toggle: Duration,
    /// Pause after a missed ball before the next serve
    pub time_out: Duration,
    /// Length of the winners-circle presentation
    pub winners_circle: Duration,
    /// Serve pace in Hz
    pub default_pace: u32,
    /// Score blink rate during the winners circle, in Hz
    pub winners_blink_hz: u32,
    /// Track index the ball is served from after a miss
    pub default_position: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(20),
            hitzone_toggle: Duration::from_millis(150),
            time_out: Duration::from_millis(1800),
            winners_circle: Duration::from_millis(2500),
            default_pace: 5,
            winners_blink_hz: 8,
            default_position: 12,
        }
    }
}

/// Rejected configuration values
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Debounce longer than 100 ms
    DebounceTooLong,
    /// A pace or blink rate of 0 Hz or above the 1 kHz tick
    InvalidRate,
    /// Serve position outside the game zone
    PositionOutsideGameZone,
}

#[cfg(feature = "std")]
impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::DebounceTooLong => write!(f, "Debounce must be <= 100ms"),
            ConfigError::InvalidRate => write!(f, "Rates must be between 1 and 1000 Hz"),
            ConfigError::PositionOutsideGameZone => write!(f, "Serve position must be inside the game zone"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

impl GameConfig {
    /// Create a new configuration with validation
    pub fn new(
        debounce_ms: u32,
        hitzone_toggle_ms: u32,
        time_out_ms: u32,
        winners_circle_ms: u32,
        default_pace: u32,
        default_position: u8,
    ) -> Result<Self, ConfigError> {
        if debounce_ms > 100 {
            return Err(ConfigError::DebounceTooLong);
        }
        if default_pace == 0 || default_pace > 1000 {
            return Err(ConfigError::InvalidRate);
        }
        if !track::in_game_zone(default_position) {
            return Err(ConfigError::PositionOutsideGameZone);
        }

        Ok(Self {
            debounce: Duration::from_millis(debounce_ms),
            hitzone_toggle: Duration::from_millis(hitzone_toggle_ms),
            time_out: Duration::from_millis(time_out_ms),
            winners_circle: Duration::from_millis(winners_circle_ms),
            default_pace,
            winners_blink_hz: Self::default().winners_blink_hz,
            default_position,
        })
    }

    /// Period of one animation tick at the given pace
    pub fn tick_period(pace: u32) -> Duration {
        Duration::from_millis(1000 / pace.max(1))
    }
}
