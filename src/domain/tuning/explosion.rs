/// Lifecycle tuning for explosions (the renderer maps progress to animation frames).

#[derive(Debug, Clone, Copy)]
pub struct ExplosionTuning {
    /// Progress value of a freshly spawned explosion.
    pub initial_progress: f32,

    /// Progress added every tick.
    pub step: f32,

    /// Explosions are removed once progress exceeds this frame count.
    pub frame_count: f32,
}

impl Default for ExplosionTuning {
    fn default() -> Self {
        Self {
            initial_progress: 1.0,
            step: 0.1,
            frame_count: 17.0,
        }
    }
}
