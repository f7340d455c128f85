//! Coach Day - a dog-handling and tennis coaching life sim
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, appointments, progression, hand-offs)
//! - `minigame`: Rhythm and paddle mini-games played during sessions
//! - `game`: The game context that wires everything together
//! - `settings`: Data-driven game balance
//! - `records`: Personal bests per mini-game

pub mod error;
pub mod game;
pub mod minigame;
pub mod records;
pub mod settings;
pub mod sim;

pub use error::{GameError, Result};
pub use game::{FrameInput, Game, GameEvent};
pub use records::Records;
pub use settings::{DifficultyPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Minutes in an in-game hour / hours in a day
    pub const MINUTES_PER_HOUR: u32 = 60;
    pub const HOURS_PER_DAY: u32 = 24;
    pub const MINUTES_PER_DAY: u32 = MINUTES_PER_HOUR * HOURS_PER_DAY;
    /// Upper bound on minutes a single clock tick may emit
    pub const MAX_MINUTES_PER_TICK: u32 = 240;

    /// Paddle court dimensions (court units, origin bottom-left)
    pub const COURT_WIDTH: f32 = 320.0;
    pub const COURT_HEIGHT: f32 = 480.0;
    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 64.0;
    pub const PADDLE_HEIGHT: f32 = 10.0;
    /// Distance of each paddle from its baseline
    pub const PADDLE_INSET: f32 = 24.0;
    /// Ball defaults
    pub const BALL_RADIUS: f32 = 6.0;
    /// Speed boost when ball hits a paddle (multiplicative)
    pub const PADDLE_BOOST: f32 = 1.05;
}

/// Clamp a value into `[lo, hi]`, treating NaN as `lo`
#[inline]
pub fn clamp_f32(value: f32, lo: f32, hi: f32) -> f32 {
    if value.is_nan() { lo } else { value.clamp(lo, hi) }
}
