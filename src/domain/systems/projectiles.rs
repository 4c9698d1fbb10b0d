use super::collision::{find_bullet_hit, wall_collision};
use super::explosions::spawn_explosion;
use crate::domain::arena::Arena;
use crate::domain::math::heading;
use crate::domain::state::{Bullet, Explosion, Robot};
use crate::domain::tuning::{BulletTuning, ExplosionTuning, FirePolicy};
use std::time::Duration;
use tracing::info;

/// Spawns a bullet for `robot` if the fire policy allows it at simulated time `now`.
///
/// Returns the new bullet id, or `None` when the shot was ignored.
pub fn fire(
    robot: &mut Robot,
    bullets: &mut Vec<Bullet>,
    next_bullet_id: &mut u64,
    now: Duration,
    cfg: &BulletTuning,
) -> Option<u64> {
    let allowed = match cfg.fire_policy {
        FirePolicy::Cooldown => robot
            .last_shot_at
            .is_none_or(|last| now.saturating_sub(last) >= cfg.cooldown),
        FirePolicy::SingleBullet => !bullets.iter().any(|b| b.owner_id == robot.id),
    };
    if !allowed {
        return None;
    }

    let id = *next_bullet_id;
    *next_bullet_id = next_bullet_id.wrapping_add(1);
    bullets.push(Bullet {
        id,
        owner_id: robot.id.clone(),
        x: robot.x,
        y: robot.y,
        direction: robot.direction + robot.turret_direction,
    });
    robot.last_shot_at = Some(now);
    Some(id)
}

/// Moves every bullet one step and resolves wall exits and hits.
///
/// A bullet leaving the arena vanishes harmlessly. A bullet scoring a hit deals `damage`
/// once, leaves an explosion at the victim and is consumed.
pub fn tick_bullets(
    robots: &mut [Robot],
    bullets: &mut Vec<Bullet>,
    explosions: &mut Vec<Explosion>,
    arena: &Arena,
    cfg: &BulletTuning,
    explosion_cfg: &ExplosionTuning,
) {
    bullets.retain_mut(|b| {
        let (dir_x, dir_y) = heading(b.direction);
        b.x += cfg.speed * dir_x;
        b.y += cfg.speed * dir_y;

        if wall_collision(arena, b.x, b.y) {
            return false;
        }

        let Some(victim) = find_bullet_hit(robots, &b.owner_id, b.x, b.y, cfg.hit_radius) else {
            return true;
        };

        let enemy = &mut robots[victim];
        enemy.health -= cfg.damage;
        explosions.push(spawn_explosion(enemy.x, enemy.y, explosion_cfg));
        info!(
            victim_id = %enemy.id,
            shooter_id = %b.owner_id,
            bullet_id = b.id,
            victim_hp = enemy.health,
            "robot hit"
        );
        false
    });
}
