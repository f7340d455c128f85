//! Mini-games played during coaching sessions
//!
//! Both games follow the same shape as the rest of the simulation: fixed
//! timestep `tick`, seeded RNG, per-tick input struct, returned events.

pub mod collision;
pub mod paddle;
pub mod rhythm;

pub use collision::{CollisionResult, Rect, ball_rect_collision, bounce_with_loss, reflect_velocity};
pub use paddle::{PaddleEvent, PaddleGame, PaddleInput, PaddleModifiers, PaddlePhase, PaddleResult};
pub use rhythm::{Grade, Judgement, RhythmEvent, RhythmGame, RhythmInput, RhythmResult};

use serde::{Deserialize, Serialize};

/// Which mini-game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MiniGameKind {
    Rhythm,
    Paddle,
}

/// Outcome of either mini-game, normalized for rewards
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MiniGameResult {
    Rhythm(RhythmResult),
    Paddle(PaddleResult),
}

impl MiniGameResult {
    pub fn kind(&self) -> MiniGameKind {
        match self {
            MiniGameResult::Rhythm(_) => MiniGameKind::Rhythm,
            MiniGameResult::Paddle(_) => MiniGameKind::Paddle,
        }
    }

    /// 0..1 quality of the session, drives reward scaling
    pub fn performance(&self) -> f32 {
        match self {
            MiniGameResult::Rhythm(r) => r.accuracy(),
            MiniGameResult::Paddle(p) => p.performance(),
        }
    }

    pub fn score(&self) -> u64 {
        match self {
            MiniGameResult::Rhythm(r) => r.score,
            MiniGameResult::Paddle(p) => p.score(),
        }
    }

    /// Below this a session counts as failed (an F in the rhythm game)
    pub fn is_failure(&self) -> bool {
        self.performance() < FAILURE_THRESHOLD
    }
}

/// Performance under which a session fails
pub const FAILURE_THRESHOLD: f32 = 0.5;
