// Use-case level inputs/outputs for the world task.

use crate::domain::{AgentCommand, BulletSnapshot, ExplosionSnapshot, RobotId, RobotSnapshot};

pub use crate::domain::BattlePhase as BattleStatus;

#[derive(Debug, Clone)]
pub enum GameEvent {
    // A validated request from a robot's agent.
    Command {
        robot_id: RobotId,
        command: AgentCommand,
    },
    // The agent hung up; its robot idles from now on.
    Detached { robot_id: RobotId },
}

#[derive(Debug, Clone)]
pub struct WorldUpdate {
    pub tick: u64,
    pub robots: Vec<RobotSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub explosions: Vec<ExplosionSnapshot>,
}
