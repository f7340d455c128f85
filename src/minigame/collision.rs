//! Collision detection and response for the paddle court
//!
//! Paddles are axis-aligned rectangles and the ball is a circle, so contact
//! is a closest-point test against the rectangle.

use glam::Vec2;

/// Axis-aligned rectangle given by its center and half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub center: Vec2,
    pub half: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size / 2.0,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Closest point on or in the rectangle to `p`
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Contact point (if hit)
    pub point: Vec2,
    /// Surface normal at contact, pointing toward the ball center
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }
}

/// Check collision between a ball and a rectangle
pub fn ball_rect_collision(ball_pos: Vec2, ball_radius: f32, rect: &Rect) -> CollisionResult {
    let closest = rect.closest_point(ball_pos);
    let delta = ball_pos - closest;
    let dist_sq = delta.length_squared();

    if dist_sq > ball_radius * ball_radius {
        return CollisionResult::miss();
    }

    if dist_sq > 1e-6 {
        let dist = dist_sq.sqrt();
        return CollisionResult {
            hit: true,
            point: closest,
            normal: delta / dist,
            penetration: ball_radius - dist,
        };
    }

    // Ball center inside the rectangle: push out along the shallowest axis
    let local = ball_pos - rect.center;
    let overlap = rect.half - local.abs();
    let (normal, depth) = if overlap.x < overlap.y {
        (Vec2::new(local.x.signum(), 0.0), overlap.x)
    } else {
        (Vec2::new(0.0, local.y.signum()), overlap.y)
    };
    CollisionResult {
        hit: true,
        point: ball_pos,
        normal,
        penetration: depth + ball_radius,
    }
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Reflect off a wall, keeping only `restitution` of the normal component
///
/// The tangential component is untouched, so a glancing bounce loses little
/// energy and a head-on one loses the most.
pub fn bounce_with_loss(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    let tangential = velocity - vn * normal;
    tangential - vn * restitution * normal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_above_rect_hits() {
        let rect = Rect::new(Vec2::new(100.0, 20.0), Vec2::new(60.0, 10.0));
        let result = ball_rect_collision(Vec2::new(100.0, 29.0), 6.0, &rect);
        assert!(result.hit);
        assert!((result.normal - Vec2::Y).length() < 1e-4);
        assert!((result.penetration - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_ball_far_away_misses() {
        let rect = Rect::new(Vec2::new(100.0, 20.0), Vec2::new(60.0, 10.0));
        assert!(!ball_rect_collision(Vec2::new(200.0, 200.0), 6.0, &rect).hit);
    }

    #[test]
    fn test_center_inside_pushes_out_shallow_axis() {
        let rect = Rect::new(Vec2::ZERO, Vec2::new(60.0, 10.0));
        let result = ball_rect_collision(Vec2::new(5.0, 3.0), 6.0, &rect);
        assert!(result.hit);
        assert_eq!(result.normal, Vec2::Y);
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec2::new(100.0, 0.0), Vec2::new(-1.0, 0.0));
        assert!((reflected.x + 100.0).abs() < 0.001);
        assert!(reflected.y.abs() < 0.001);
    }

    #[test]
    fn test_bounce_loses_normal_energy_only() {
        let v = bounce_with_loss(Vec2::new(-100.0, 50.0), Vec2::X, 0.5);
        assert!((v.x - 50.0).abs() < 1e-4);
        assert!((v.y - 50.0).abs() < 1e-4);
        // Moving away from the wall: unchanged
        assert_eq!(bounce_with_loss(Vec2::new(10.0, 0.0), Vec2::X, 0.5), Vec2::new(10.0, 0.0));
    }
}
