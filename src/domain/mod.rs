// Domain layer: core simulation types and rules.

pub mod arena;
pub mod battle;
pub mod command;
pub mod math;
pub mod state;
pub mod systems;
pub mod tuning;

pub use arena::Arena;
pub use battle::{Battle, BattleError, BattlePhase, Outbound, RobotEvent, TickReport};
pub use command::{AgentCommand, CallbackId, Command, CommandKind, CommandQueue, CommandStatus};
pub use state::{
    Bullet, BulletSnapshot, Explosion, ExplosionSnapshot, Robot, RobotId, RobotSnapshot,
};
pub use tuning::Tuning;
