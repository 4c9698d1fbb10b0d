use crate::domain::state::Explosion;
use crate::domain::tuning::ExplosionTuning;

pub fn spawn_explosion(x: f32, y: f32, cfg: &ExplosionTuning) -> Explosion {
    Explosion {
        x,
        y,
        progress: cfg.initial_progress,
    }
}

/// Advances every explosion and drops those whose progress went past the last frame.
pub fn tick_explosions(explosions: &mut Vec<Explosion>, cfg: &ExplosionTuning) {
    explosions.retain_mut(|e| {
        e.progress += cfg.step;
        e.progress <= cfg.frame_count
    });
}
