use glam::Vec3;

use crate::api::config::PhysicsParams;
use crate::core::time::clamp_dt;

/// Largest step the integrator accepts, in seconds.
pub const MAX_PHYSICS_DT: f32 = 0.1;
/// Squash factor bounds. Zero would collapse the model.
pub const MIN_SQUASH: f32 = 0.05;
pub const MAX_SQUASH: f32 = 1.5;
/// Below this distance the squash factor snaps to its target.
pub const SQUASH_EPSILON: f32 = 1e-3;

/// What happens when a body reaches the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroundResponse {
    /// Stop dead (the character).
    Stick,
    /// Reflect vertical speed scaled by `damping`; settle below `epsilon` (items).
    Bounce { damping: f32, epsilon: f32 },
}

impl GroundResponse {
    pub fn bounce(params: &PhysicsParams) -> Self {
        GroundResponse::Bounce {
            damping: params.bounce_damping,
            epsilon: params.settle_epsilon,
        }
    }
}

/// Point-mass state shared by the character and loose items.
///
/// Y is up. `rotation` is yaw in degrees. `scale` is uniform; `squash_factor`
/// multiplies the vertical scale only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsBody {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: f32,
    pub scale: f32,
    pub squash_factor: f32,
    pub squash_target: f32,
    /// Resting on the ground with no upward velocity.
    pub grounded: bool,
}

impl PhysicsBody {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation: 0.0,
            scale: 1.0,
            squash_factor: 1.0,
            squash_target: 1.0,
            grounded: false,
        }
    }

    /// Set the squash target, clamped into (0, 1.5].
    pub fn apply_squash(&mut self, target: f32) {
        self.squash_target = target.clamp(MIN_SQUASH, MAX_SQUASH);
    }

    /// Snap to `factor` and hold it there until the target changes again.
    pub fn squash_to(&mut self, factor: f32) {
        self.apply_squash(factor);
        self.squash_factor = self.squash_target;
    }

    /// Add an instantaneous velocity change. Upward kicks leave the ground.
    pub fn apply_impulse(&mut self, delta_v: Vec3) {
        self.velocity += delta_v;
        if self.velocity.y > 0.0 {
            self.grounded = false;
        }
    }

    /// Advance one tick: gravity, position, ground contact, friction.
    ///
    /// Returns the downward speed at impact if the body hit the ground this tick.
    pub fn integrate(
        &mut self,
        params: &PhysicsParams,
        ground_y: f32,
        response: GroundResponse,
        dt: f32,
    ) -> Option<f32> {
        let dt = clamp_dt(dt, MAX_PHYSICS_DT);

        if self.grounded && self.velocity.y <= 0.0 {
            self.velocity.y = 0.0;
        } else {
            self.velocity.y -= params.gravity * dt;
        }
        self.position += self.velocity * dt;

        let mut impact = None;
        if self.position.y < ground_y {
            impact = Some(-self.velocity.y);
            self.position.y = ground_y;
            match response {
                GroundResponse::Stick => {
                    self.velocity.y = 0.0;
                    self.grounded = true;
                }
                GroundResponse::Bounce { damping, epsilon } => {
                    self.velocity.y = -self.velocity.y * damping;
                    if self.velocity.y.abs() < epsilon {
                        self.velocity.y = 0.0;
                        self.grounded = true;
                    } else {
                        self.grounded = false;
                    }
                }
            }
        }

        self.velocity.x *= params.friction;
        self.velocity.z *= params.friction;
        impact
    }

    /// Move the squash factor a fixed fraction of the way to its target.
    pub fn relax_squash(&mut self, recovery: f32) {
        let diff = self.squash_target - self.squash_factor;
        if diff.abs() < SQUASH_EPSILON {
            self.squash_factor = self.squash_target;
        } else {
            self.squash_factor += diff * recovery.clamp(0.0, 1.0);
        }
        self.squash_factor = self.squash_factor.clamp(MIN_SQUASH, MAX_SQUASH);
    }

    /// On the ground and not moving vertically.
    pub fn is_settled(&self, ground_y: f32, epsilon: f32) -> bool {
        self.position.y == ground_y && self.velocity.y.abs() < epsilon
    }

    pub fn horizontal_speed(&self) -> f32 {
        (self.velocity.x * self.velocity.x + self.velocity.z * self.velocity.z).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn dropped_item_settles_on_ground() {
        let params = PhysicsParams::default();
        let mut item = PhysicsBody::at(Vec3::new(0.0, 2.0, 0.0));
        let response = GroundResponse::bounce(&params);

        let mut settled_at = None;
        for tick in 0..600 {
            item.integrate(&params, -0.8, response, DT);
            if settled_at.is_none() && item.is_settled(-0.8, 0.1) {
                settled_at = Some(tick);
            }
        }
        assert!(settled_at.is_some(), "item never settled: {:?}", item);
        assert_eq!(item.position.y, -0.8);
        assert!(item.velocity.y.abs() < 0.1);
    }

    #[test]
    fn item_bounces_before_settling() {
        let params = PhysicsParams::default();
        let mut item = PhysicsBody::at(Vec3::new(0.0, 2.0, 0.0));
        let response = GroundResponse::bounce(&params);
        let mut bounces = 0;
        for _ in 0..600 {
            if item.integrate(&params, -0.8, response, DT).is_some() && item.velocity.y > 0.0 {
                bounces += 1;
            }
        }
        assert!(bounces >= 3, "expected several bounces, got {}", bounces);
    }

    #[test]
    fn character_sticks_to_ground() {
        let params = PhysicsParams::default();
        let mut body = PhysicsBody::at(Vec3::new(0.0, -0.5, 0.0));
        body.apply_impulse(Vec3::new(0.0, 3.0, 0.0));
        assert!(!body.grounded);
        for _ in 0..120 {
            body.integrate(&params, -0.5, GroundResponse::Stick, DT);
        }
        assert_eq!(body.position.y, -0.5);
        assert_eq!(body.velocity.y, 0.0);
        assert!(body.grounded);
    }

    #[test]
    fn friction_decays_horizontal_velocity() {
        let params = PhysicsParams::default();
        let mut body = PhysicsBody::at(Vec3::new(0.0, -0.8, 0.0));
        body.grounded = true;
        body.velocity.x = 1.0;
        body.integrate(&params, -0.8, GroundResponse::Stick, DT);
        assert!((body.velocity.x - 0.92).abs() < 1e-6);
    }

    #[test]
    fn huge_dt_is_clamped() {
        let params = PhysicsParams::default();
        let mut body = PhysicsBody::at(Vec3::new(0.0, 10.0, 0.0));
        body.integrate(&params, -0.8, GroundResponse::Stick, 5.0);
        // One clamped 100 ms step: v = -0.98, y = 10 - 0.098
        assert!((body.position.y - (10.0 - 0.098)).abs() < 1e-4);
    }

    #[test]
    fn squash_to_reaches_full_depth_at_once() {
        let mut body = PhysicsBody::at(Vec3::ZERO);
        body.squash_to(0.85);
        assert_eq!(body.squash_factor, 0.85);
        body.relax_squash(0.1);
        assert_eq!(body.squash_factor, 0.85);

        body.apply_squash(1.0);
        body.relax_squash(0.1);
        assert!(body.squash_factor > 0.85 && body.squash_factor < 1.0);
    }

    #[test]
    fn squash_relaxes_monotonically_and_converges() {
        let mut body = PhysicsBody::at(Vec3::ZERO);
        body.squash_factor = 0.7;
        body.apply_squash(1.0);
        let mut prev = body.squash_factor;
        let mut ticks = 0;
        while body.squash_factor != body.squash_target {
            body.relax_squash(0.1);
            assert!(body.squash_factor >= prev, "squash moved away from target");
            prev = body.squash_factor;
            ticks += 1;
            assert!(ticks < 200, "squash did not converge");
        }
    }

    #[test]
    fn squash_target_is_clamped() {
        let mut body = PhysicsBody::at(Vec3::ZERO);
        body.apply_squash(3.0);
        assert_eq!(body.squash_target, MAX_SQUASH);
        body.apply_squash(-1.0);
        assert!(body.squash_target > 0.0);
    }
}
