// Gameplay tuning, kept separate from runtime/server configuration.

pub mod bullet;
pub mod explosion;
pub mod robot;

pub use bullet::{BulletTuning, FirePolicy};
pub use explosion::ExplosionTuning;
pub use robot::RobotTuning;

#[derive(Debug, Clone, Copy, Default)]
pub struct Tuning {
    pub robot: RobotTuning,
    pub bullet: BulletTuning,
    pub explosion: ExplosionTuning,
}
