// Collision queries. These never mutate state; callers apply damage.

use crate::domain::arena::Arena;
use crate::domain::math::distance;
use crate::domain::state::Robot;

pub fn wall_collision(arena: &Arena, x: f32, y: f32) -> bool {
    !arena.contains(x, y)
}

/// Index of the first living robot, other than the mover, whose centre is closer than `radius`.
pub fn find_robot_collision(
    robots: &[Robot],
    mover: usize,
    x: f32,
    y: f32,
    radius: f32,
) -> Option<usize> {
    robots
        .iter()
        .enumerate()
        .filter(|(i, r)| *i != mover && r.is_alive())
        .find(|(_, r)| distance(x, y, r.x, r.y) < radius)
        .map(|(i, _)| i)
}

/// Index of the first living non-owner robot within `radius` of a bullet.
pub fn find_bullet_hit(
    robots: &[Robot],
    owner_id: &str,
    x: f32,
    y: f32,
    radius: f32,
) -> Option<usize> {
    robots
        .iter()
        .position(|r| r.id != owner_id && r.is_alive() && distance(x, y, r.x, r.y) < radius)
}
