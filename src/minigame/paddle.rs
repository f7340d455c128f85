//! Paddle mini-game played during tennis sessions
//!
//! The student's paddle sits at the bottom of a rectangular court and the
//! coach's at the top. Side walls bounce the ball with some energy loss;
//! paddles reflect it with deflection from where it hit. The session ends
//! when the student runs out of balls or reaches the target number of
//! returns.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionResult, Rect, ball_rect_collision, bounce_with_loss, reflect_velocity};
use crate::consts::*;
use crate::settings::PaddleSettings;

/// Current phase of the rally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddlePhase {
    /// Ball resting on the student's paddle, waiting for launch
    Serve,
    /// Ball in play
    Playing,
    Paused,
    Finished,
}

/// The ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Ticks before a paddle can hit again (prevents sticking)
    pub paddle_cooldown: u32,
}

/// A horizontal paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Center x
    pub x: f32,
    /// Center y (fixed)
    pub y: f32,
    pub width: f32,
    /// Horizontal velocity (for "english" on the ball)
    pub vel_x: f32,
}

impl Paddle {
    pub fn new(y: f32, width: f32) -> Self {
        Self {
            x: COURT_WIDTH / 2.0,
            y,
            width,
            vel_x: 0.0,
        }
    }

    pub fn as_rect(&self) -> Rect {
        Rect::new(Vec2::new(self.x, self.y), Vec2::new(self.width, PADDLE_HEIGHT))
    }

    /// Move toward a target x, limited to `max_speed`
    pub fn move_toward(&mut self, target_x: f32, dt: f32, max_speed: f32) {
        let half = self.width / 2.0;
        let target = target_x.clamp(half, COURT_WIDTH - half);
        let max_delta = max_speed * dt;
        let delta = (target - self.x).clamp(-max_delta, max_delta);
        self.vel_x = if dt > 0.0 { delta / dt } else { 0.0 };
        self.x += delta;
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct PaddleInput {
    /// Where the student wants their paddle
    pub target_x: Option<f32>,
    pub launch: bool,
    pub pause: bool,
    /// The student plays itself
    pub autoplay: bool,
}

/// Things that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum PaddleEvent {
    Served,
    Returned { rally: u32 },
    CoachReturned,
    BallLost { balls_left: u8 },
    PointWon,
    Finished(PaddleResult),
}

/// How the session went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaddleResult {
    pub returns: u32,
    pub longest_rally: u32,
    pub points: u32,
    pub balls_lost: u32,
    pub target_returns: u32,
}

impl PaddleResult {
    pub fn score(&self) -> u64 {
        self.returns as u64 * 100 + self.points as u64 * 250 + self.longest_rally as u64 * 50
    }

    /// Fraction of the target reached, 0..1
    pub fn performance(&self) -> f32 {
        if self.target_returns == 0 {
            return 1.0;
        }
        (self.returns as f32 / self.target_returns as f32).min(1.0)
    }
}

/// Multipliers the player's skills apply to the student paddle
#[derive(Debug, Clone, Copy)]
pub struct PaddleModifiers {
    pub width_scale: f32,
    pub speed_scale: f32,
}

impl Default for PaddleModifiers {
    fn default() -> Self {
        Self {
            width_scale: 1.0,
            speed_scale: 1.0,
        }
    }
}

/// Complete paddle game state
#[derive(Debug, Clone)]
pub struct PaddleGame {
    pub phase: PaddlePhase,
    pub player: Paddle,
    pub coach: Paddle,
    pub ball: Ball,
    pub balls_left: u8,
    pub returns: u32,
    pub rally: u32,
    pub longest_rally: u32,
    pub points: u32,
    pub time_ticks: u64,
    /// Where the coach is aiming relative to the ball
    coach_aim_offset: f32,
    settings: PaddleSettings,
    player_speed: f32,
    balls_lost: u32,
    rng: Pcg32,
}

impl PaddleGame {
    pub fn new(seed: u64, settings: &PaddleSettings, modifiers: PaddleModifiers) -> Self {
        let width = (PADDLE_WIDTH * modifiers.width_scale).min(COURT_WIDTH / 2.0);
        let player = Paddle::new(PADDLE_INSET, width);
        let mut game = Self {
            phase: PaddlePhase::Serve,
            coach: Paddle::new(COURT_HEIGHT - PADDLE_INSET, PADDLE_WIDTH),
            ball: Ball {
                pos: Vec2::ZERO,
                vel: Vec2::ZERO,
                radius: BALL_RADIUS,
                paddle_cooldown: 0,
            },
            player,
            balls_left: settings.balls,
            returns: 0,
            rally: 0,
            longest_rally: 0,
            points: 0,
            time_ticks: 0,
            coach_aim_offset: 0.0,
            settings: settings.clone(),
            player_speed: settings.paddle_speed * modifiers.speed_scale,
            balls_lost: 0,
            rng: Pcg32::seed_from_u64(seed),
        };
        game.attach_ball();
        game
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PaddlePhase::Finished
    }

    pub fn result(&self) -> PaddleResult {
        PaddleResult {
            returns: self.returns,
            longest_rally: self.longest_rally,
            points: self.points,
            balls_lost: self.balls_lost,
            target_returns: self.settings.target_returns,
        }
    }

    fn attach_ball(&mut self) {
        self.ball.pos = Vec2::new(
            self.player.x,
            self.player.y + PADDLE_HEIGHT / 2.0 + self.ball.radius + 1.0,
        );
        self.ball.vel = Vec2::ZERO;
        self.ball.paddle_cooldown = 0;
    }

    /// Advance the game by one fixed timestep
    pub fn tick(&mut self, input: &PaddleInput, dt: f32) -> Vec<PaddleEvent> {
        let mut events = Vec::new();

        if input.pause {
            match self.phase {
                PaddlePhase::Serve | PaddlePhase::Playing => {
                    self.phase = PaddlePhase::Paused;
                    return events;
                }
                PaddlePhase::Paused => {
                    self.phase = if self.ball.vel == Vec2::ZERO {
                        PaddlePhase::Serve
                    } else {
                        PaddlePhase::Playing
                    };
                }
                PaddlePhase::Finished => {}
            }
        }

        if matches!(self.phase, PaddlePhase::Paused | PaddlePhase::Finished) {
            return events;
        }

        self.time_ticks += 1;

        let mut input = input.clone();
        if input.autoplay {
            if self.phase == PaddlePhase::Serve {
                input.launch = true;
            }
            input.target_x = Some(self.autoplay_target());
        }

        if let Some(target) = input.target_x {
            self.player.move_toward(target, dt, self.player_speed);
        } else {
            self.player.vel_x = 0.0;
        }

        match self.phase {
            PaddlePhase::Serve => {
                self.attach_ball();
                if input.launch {
                    let angle = self.rng.random_range(-0.35f32..0.35);
                    let dir = Vec2::new(angle.sin(), angle.cos());
                    self.ball.vel = dir * self.settings.ball_start_speed;
                    self.coach_aim_offset = self.random_aim_offset();
                    self.phase = PaddlePhase::Playing;
                    events.push(PaddleEvent::Served);
                }
            }
            PaddlePhase::Playing => self.tick_playing(dt, &mut events),
            PaddlePhase::Paused | PaddlePhase::Finished => {}
        }

        events
    }

    fn random_aim_offset(&mut self) -> f32 {
        let err = self.settings.coach_aim_error.max(0.0);
        if err == 0.0 {
            0.0
        } else {
            self.rng.random_range(-err..=err)
        }
    }

    fn tick_playing(&mut self, dt: f32, events: &mut Vec<PaddleEvent>) {
        // Coach tracks the ball with imperfect aim
        let coach_target = if self.ball.vel.y > 0.0 {
            self.ball.pos.x + self.coach_aim_offset
        } else {
            COURT_WIDTH / 2.0
        };
        self.coach.move_toward(coach_target, dt, self.settings.coach_speed);

        if self.ball.paddle_cooldown > 0 {
            self.ball.paddle_cooldown -= 1;
        }

        let speed = self.ball.vel.length();
        let move_dist = speed * dt;
        let step_size = self.ball.radius * 0.5;
        let num_steps = ((move_dist / step_size).ceil() as usize).clamp(1, 20);
        let step_dt = dt / num_steps as f32;

        for _ in 0..num_steps {
            self.ball.pos += self.ball.vel * step_dt;
            let r = self.ball.radius;

            // Side walls lose energy on every bounce
            if self.ball.pos.x < r {
                self.ball.vel = bounce_with_loss(self.ball.vel, Vec2::X, self.settings.wall_restitution);
                self.ball.pos.x = r;
            } else if self.ball.pos.x > COURT_WIDTH - r {
                self.ball.vel =
                    bounce_with_loss(self.ball.vel, Vec2::NEG_X, self.settings.wall_restitution);
                self.ball.pos.x = COURT_WIDTH - r;
            }

            if self.ball.paddle_cooldown == 0 {
                let player_hit = ball_rect_collision(self.ball.pos, r, &self.player.as_rect());
                if player_hit.hit && self.ball.vel.y < 0.0 {
                    self.hit_ball(true, &player_hit);
                    self.rally += 1;
                    self.returns += 1;
                    self.longest_rally = self.longest_rally.max(self.rally);
                    self.coach_aim_offset = self.random_aim_offset();
                    events.push(PaddleEvent::Returned { rally: self.rally });
                    if self.returns >= self.settings.target_returns {
                        self.finish(events);
                        return;
                    }
                    continue;
                }

                let coach_hit = ball_rect_collision(self.ball.pos, r, &self.coach.as_rect());
                if coach_hit.hit && self.ball.vel.y > 0.0 {
                    self.hit_ball(false, &coach_hit);
                    events.push(PaddleEvent::CoachReturned);
                    continue;
                }
            }

            if self.ball.pos.y < -r {
                self.balls_left = self.balls_left.saturating_sub(1);
                self.balls_lost += 1;
                self.rally = 0;
                log::debug!("Ball lost, {} left", self.balls_left);
                events.push(PaddleEvent::BallLost {
                    balls_left: self.balls_left,
                });
                if self.balls_left == 0 {
                    self.finish(events);
                } else {
                    self.phase = PaddlePhase::Serve;
                    self.attach_ball();
                }
                return;
            }

            if self.ball.pos.y > COURT_HEIGHT + r {
                self.points += 1;
                events.push(PaddleEvent::PointWon);
                self.phase = PaddlePhase::Serve;
                self.attach_ball();
                return;
            }
        }

        // Clamp speed (wall losses can slow but not stop the ball)
        let speed = self.ball.vel.length();
        if speed < self.settings.ball_min_speed {
            self.ball.vel = self.ball.vel.normalize_or_zero() * self.settings.ball_min_speed;
        } else if speed > self.settings.ball_max_speed {
            self.ball.vel = self.ball.vel.normalize_or_zero() * self.settings.ball_max_speed;
        }
    }

    /// Reflect the ball off a paddle with deflection and english
    fn hit_ball(&mut self, by_player: bool, contact: &CollisionResult) {
        let paddle = if by_player { &self.player } else { &self.coach };
        let normal = if by_player { Vec2::Y } else { Vec2::NEG_Y };

        // Normalize contact position: 0 = center, -1/+1 = edges
        let half = paddle.width / 2.0;
        let hit_offset = ((contact.point.x - paddle.x) / half).clamp(-1.0, 1.0);

        let speed = self.ball.vel.length();
        let base_reflect = reflect_velocity(self.ball.vel, normal);
        let deflection = Vec2::X * hit_offset * speed * 0.6;
        let english = Vec2::X * paddle.vel_x * 0.15;

        let mut dir = (base_reflect + deflection + english).normalize_or_zero();
        // Keep the ball travelling up/down the court
        if dir.y.abs() < 0.35 {
            dir.y = 0.35 * normal.y;
            dir = dir.normalize();
        }
        if dir.y * normal.y < 0.0 {
            dir.y = -dir.y;
        }

        let face_y = paddle.y + normal.y * (PADDLE_HEIGHT / 2.0 + self.ball.radius + 0.5);
        let boosted = (speed * PADDLE_BOOST).min(self.settings.ball_max_speed);
        self.ball.vel = dir * boosted;

        // Push out along the contact normal; side or back contacts go to the face
        if contact.normal.dot(normal) > 0.5 {
            self.ball.pos += contact.normal * (contact.penetration + 0.5);
        } else {
            self.ball.pos.y = face_y;
        }
        self.ball.paddle_cooldown = 8;
    }

    fn finish(&mut self, events: &mut Vec<PaddleEvent>) {
        self.phase = PaddlePhase::Finished;
        let result = self.result();
        log::info!(
            "Paddle session over: {} returns, longest rally {}",
            result.returns,
            result.longest_rally
        );
        events.push(PaddleEvent::Finished(result));
    }

    /// Where the autoplaying student should stand
    fn autoplay_target(&self) -> f32 {
        let ball = &self.ball;
        if ball.vel.y >= 0.0 {
            // Ball heading away: drift back toward center
            return (self.player.x + COURT_WIDTH / 2.0) / 2.0;
        }

        // Predict where the ball crosses our paddle line, folding wall bounces
        let t = (self.player.y - ball.pos.y) / ball.vel.y;
        let x = ball.pos.x + ball.vel.x * t.max(0.0);
        let r = ball.radius;
        let span = COURT_WIDTH - 2.0 * r;
        let m = (x - r).rem_euclid(2.0 * span);
        let folded = if m > span { 2.0 * span - m } else { m };

        // Slight wobble so rallies vary
        let wobble = (self.time_ticks as f32 * 0.05).sin() * self.player.width * 0.2;
        r + folded + wobble
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(seed: u64) -> PaddleGame {
        PaddleGame::new(seed, &PaddleSettings::default(), PaddleModifiers::default())
    }

    #[test]
    fn test_serve_to_playing() {
        let mut g = game(1);
        assert_eq!(g.phase, PaddlePhase::Serve);
        g.tick(&PaddleInput::default(), SIM_DT);
        assert_eq!(g.phase, PaddlePhase::Serve);

        let launch = PaddleInput {
            launch: true,
            ..Default::default()
        };
        let events = g.tick(&launch, SIM_DT);
        assert_eq!(events, vec![PaddleEvent::Served]);
        assert_eq!(g.phase, PaddlePhase::Playing);
        assert!(g.ball.vel.y > 0.0);
    }

    #[test]
    fn test_pause_toggle() {
        let mut g = game(2);
        let launch = PaddleInput {
            launch: true,
            ..Default::default()
        };
        g.tick(&launch, SIM_DT);
        let pause = PaddleInput {
            pause: true,
            ..Default::default()
        };
        g.tick(&pause, SIM_DT);
        assert_eq!(g.phase, PaddlePhase::Paused);
        let pos = g.ball.pos;
        g.tick(&PaddleInput::default(), SIM_DT);
        assert_eq!(g.ball.pos, pos);
        g.tick(&pause, SIM_DT);
        assert_eq!(g.phase, PaddlePhase::Playing);
    }

    #[test]
    fn test_missed_balls_end_the_session() {
        let mut g = game(3);
        let balls = g.balls_left;
        let mut lost = 0;
        let mut finished = false;
        for _ in 0..balls {
            // Ball dropping straight down the far side, paddle parked left
            g.phase = PaddlePhase::Playing;
            g.player.x = 40.0;
            g.ball.pos = Vec2::new(COURT_WIDTH - 40.0, 200.0);
            g.ball.vel = Vec2::new(0.0, -300.0);
            for _ in 0..120 {
                let events = g.tick(&PaddleInput::default(), SIM_DT);
                finished |= events.iter().any(|e| matches!(e, PaddleEvent::Finished(_)));
                if events.iter().any(|e| matches!(e, PaddleEvent::BallLost { .. })) {
                    lost += 1;
                    break;
                }
            }
        }
        assert_eq!(lost, balls);
        assert!(finished);
        assert!(g.is_finished());
        assert_eq!(g.result().balls_lost, balls as u32);
        assert_eq!(g.result().returns, 0);
    }

    #[test]
    fn test_autoplay_makes_returns() {
        let mut g = game(4);
        let input = PaddleInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..(60 * 600) {
            g.tick(&input, SIM_DT);
            if g.is_finished() {
                break;
            }
        }
        assert!(g.is_finished());
        assert!(g.result().returns > 0);
    }

    #[test]
    fn test_ball_stays_inside_side_walls() {
        let mut g = game(5);
        let input = PaddleInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..(60 * 60) {
            g.tick(&input, SIM_DT);
            if g.phase == PaddlePhase::Playing {
                assert!(g.ball.pos.x >= g.ball.radius - 0.01);
                assert!(g.ball.pos.x <= COURT_WIDTH - g.ball.radius + 0.01);
                let speed = g.ball.vel.length();
                assert!(speed <= g.settings.ball_max_speed + 0.5);
            }
        }
    }

    #[test]
    fn test_return_leaves_ball_clear_of_paddle() {
        let mut g = game(6);
        g.phase = PaddlePhase::Playing;
        g.player.x = 100.0;
        // Dropping onto the right half of the paddle, slightly embedded
        let face = g.player.y + PADDLE_HEIGHT / 2.0;
        g.ball.pos = Vec2::new(120.0, face + g.ball.radius + 2.0);
        g.ball.vel = Vec2::new(0.0, -300.0);

        let events = g.tick(&PaddleInput::default(), SIM_DT);
        assert!(events.contains(&PaddleEvent::Returned { rally: 1 }));
        assert!(g.ball.vel.y > 0.0);
        // Off-center contact deflects toward that side
        assert!(g.ball.vel.x > 0.0);
        let clearance = g.ball.pos.y - face;
        assert!(clearance >= g.ball.radius, "ball still inside paddle: {}", clearance);
    }

    #[test]
    fn test_determinism() {
        let mut a = game(99);
        let mut b = game(99);
        let input = PaddleInput {
            autoplay: true,
            ..Default::default()
        };
        for _ in 0..2_000 {
            a.tick(&input, SIM_DT);
            b.tick(&input, SIM_DT);
        }
        assert_eq!(a.ball.pos, b.ball.pos);
        assert_eq!(a.result(), b.result());
    }

    #[test]
    fn test_wider_paddle_modifier() {
        let wide = PaddleGame::new(
            1,
            &PaddleSettings::default(),
            PaddleModifiers {
                width_scale: 1.5,
                speed_scale: 1.0,
            },
        );
        assert!(wide.player.width > PADDLE_WIDTH);
        assert_eq!(wide.coach.width, PADDLE_WIDTH);
    }

    #[test]
    fn test_result_performance() {
        let result = PaddleResult {
            returns: 6,
            target_returns: 12,
            ..Default::default()
        };
        assert!((result.performance() - 0.5).abs() < 1e-6);
        assert!(result.score() > 0);
    }
}
