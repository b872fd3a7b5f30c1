//! Track geometry
//!
//! ```text
//!  0    1    2 ........... 21   22   23
//! miss hit  |-- game zone --|  hit  miss
//! `--- P2 ---'              `--- P1 ---'
//! ```

use crate::types::Direction;

/// Number of cells on the track
pub const TRACK_LEN: u8 = 24;
/// Right player's miss cell
pub const RIGHT_MISS_ZONE: u8 = 0;
/// Right player's hitzone cell
pub const RIGHT_HITZONE: u8 = 1;
/// Left player's hitzone cell
pub const LEFT_HITZONE: u8 = TRACK_LEN - 2;
/// Left player's miss cell
pub const LEFT_MISS_ZONE: u8 = TRACK_LEN - 1;
/// First game-zone cell
pub const GAME_ZONE_START: u8 = RIGHT_HITZONE + 1;
/// Last game-zone cell
pub const GAME_ZONE_END: u8 = LEFT_HITZONE - 1;

/// Returns true for cells strictly between the two hitzones
pub const fn in_game_zone(cell: u8) -> bool {
    cell >= GAME_ZONE_START && cell <= GAME_ZONE_END
}

/// One animation step. Saturates at the strip ends instead of wrapping;
/// the game FSM reacts to the miss cells long before either end is passed.
pub const fn step(cell: u8, direction: Direction) -> u8 {
    match direction {
        Direction::Left => cell.saturating_add(1),
        Direction::Right => cell.saturating_sub(1),
    }
}

/// One manual placement step, wrapping around the game zone.
/// Returns `(new cell, vacated cell)`. A cell outside the game zone is
/// first pulled back onto its nearest edge.
pub const fn step_wrapping(cell: u8, direction: Direction) -> (u8, u8) {
    let from = if cell < GAME_ZONE_START {
        GAME_ZONE_START
    } else if cell > GAME_ZONE_END {
        GAME_ZONE_END
    } else {
        cell
    };
    let to = match direction {
        Direction::Left => {
            if from == GAME_ZONE_END { GAME_ZONE_START } else { from + 1 }
        }
        Direction::Right => {
            if from == GAME_ZONE_START { GAME_ZONE_END } else { from - 1 }
        }
    };
    (to, from)
}
