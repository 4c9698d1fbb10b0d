use super::Brain;
use crate::agents::client::{AgentError, PendingCommand, RobotClient};
use crate::domain::CommandStatus;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Wanders in short hops, firing before and after each one.
///
/// A clean hop ends with a random right turn, a ram backs off, a wall turns it around.
/// The turret keeps sweeping right between hops.
pub struct Skirmisher {
    rng: StdRng,
    sweep: Option<PendingCommand>,
}

impl Skirmisher {
    pub const MAX_HOP: f32 = 40.0;
    pub const MAX_TURN: f32 = 90.0;
    pub const TURRET_SWEEP: f32 = 45.0;
    pub const BACK_OFF: f32 = 100.0;

    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sweep: None,
        }
    }

    // Keeps at most one turret sweep queued so the backlog never grows.
    async fn keep_sweeping(&mut self, robot: &RobotClient) -> Result<(), AgentError> {
        let idle = match self.sweep.as_mut() {
            None => true,
            Some(sweep) => match sweep.try_outcome() {
                None => false,
                Some(outcome) => outcome.map(|_| true)?,
            },
        };
        if idle {
            self.sweep = Some(robot.turn_turret_right(Self::TURRET_SWEEP).await?);
        }
        Ok(())
    }
}

#[async_trait]
impl Brain for Skirmisher {
    fn name(&self) -> &'static str {
        "skirmisher"
    }

    async fn run(&mut self, robot: &RobotClient) -> Result<(), AgentError> {
        robot.shoot().await?;
        self.keep_sweeping(robot).await?;

        let hop = self.rng.gen_range(0.0..Self::MAX_HOP);
        match robot.move_forward(hop).await?.outcome().await? {
            Some(CommandStatus::WallCollide) => {
                robot.turn_left(180.0).await?.outcome().await?;
                robot.shoot().await?;
            }
            Some(CommandStatus::EnemyCollide) => {
                robot.shoot().await?;
                robot.move_backward(Self::BACK_OFF).await?.outcome().await?;
            }
            Some(CommandStatus::Done) | None => {
                robot.shoot().await?;
                let turn = self.rng.gen_range(0.0..Self::MAX_TURN);
                robot.turn_right(turn).await?.outcome().await?;
                robot.shoot().await?;
            }
        }
        Ok(())
    }
}
