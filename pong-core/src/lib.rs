#![cfg_attr(not(feature = "std"), no_std)]

//! # Pong Core
//!
//! Game logic for a two-player pong played on a strip of LEDs with two
//! paddle buttons and a mode button. Everything here is driven by three
//! interrupt contexts (1 ms tick, animation tick, button edges) plus a
//! cooperative main loop, and touches hardware only through the traits in
//! [`hal`].

#[macro_use]
mod log;

pub mod types;
pub mod track;
pub mod hal;
pub mod controller;
pub mod player;
pub mod fsm;
pub mod motion;
pub mod dispatch;
pub mod scheduler;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use types::*;
pub use hal::{*, Instant, Duration};
pub use controller::ButtonLatch;
pub use player::Player;
pub use fsm::GameFsm;
pub use scheduler::{Console, PendingTriggers, Trigger};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default timing and placement used by the reference board
pub fn default_config() -> GameConfig {
    GameConfig::default()
}
