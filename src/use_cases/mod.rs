// Use cases layer: application workflows for the battle server.

pub mod arena;
pub mod game;
pub mod types;

pub use arena::{BattleHandle, BattleSettings, LaunchError, RobotPort, launch_battle};
pub use types::{BattleStatus, GameEvent, WorldUpdate};
