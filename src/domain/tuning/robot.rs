/// Gameplay tuning for robots.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).

#[derive(Debug, Clone, Copy)]
pub struct RobotTuning {
    /// Health a robot spawns with; it is alive while health stays above zero.
    pub max_health: i32,

    /// Body heading in degrees at spawn.
    pub spawn_direction: f32,

    /// Distance covered by one MOVE step.
    pub move_step: f32,

    /// Degrees turned by one ROTATE or ROTATE_TURRET step.
    pub rotation_step: f32,

    /// Degrees the radar sweeps every tick.
    pub radar_sweep_step: f32,

    /// Centre distance below which two robots touch.
    pub collision_radius: f32,

    /// Damage dealt to both robots when they touch.
    pub collision_damage: i32,

    /// Damage dealt to a robot that drives into a wall.
    pub wall_damage: i32,

    /// Inset from each arena edge for random spawn positions.
    pub spawn_margin: f32,

    /// Queued commands allowed behind the active one, per command kind.
    pub max_pending_per_kind: usize,
}

impl Default for RobotTuning {
    fn default() -> Self {
        Self {
            max_health: 50,
            spawn_direction: 40.0,
            move_step: 1.0,
            rotation_step: 1.0,
            radar_sweep_step: 1.0,
            collision_radius: 25.0,
            collision_damage: 1,
            wall_damage: 1,
            spawn_margin: 75.0,
            max_pending_per_kind: 32,
        }
    }
}
