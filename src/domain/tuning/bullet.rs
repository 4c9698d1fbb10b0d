/// Gameplay tuning for bullets.
use std::time::Duration;

/// How SHOOT requests are gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirePolicy {
    /// A new bullet is allowed once the cooldown has elapsed since the last shot.
    Cooldown,
    /// A robot may only have one bullet in flight; elapsed time is ignored.
    SingleBullet,
}

#[derive(Debug, Clone, Copy)]
pub struct BulletTuning {
    /// Distance travelled per tick.
    pub speed: f32,

    /// Distance to a robot centre that counts as a hit.
    pub hit_radius: f32,

    /// Health removed from the robot that gets hit.
    pub damage: i32,

    /// Minimum simulated time between two shots of one robot.
    pub cooldown: Duration,

    pub fire_policy: FirePolicy,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            speed: 3.0,
            hit_radius: 20.0,
            damage: 3,
            cooldown: Duration::from_millis(2500),
            fire_policy: FirePolicy::Cooldown,
        }
    }
}
