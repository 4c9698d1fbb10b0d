use super::Brain;
use crate::agents::client::{AgentError, RobotClient};
use async_trait::async_trait;

/// Stands still, sweeps the turret counter-clockwise and fires after every sweep.
#[derive(Debug, Clone)]
pub struct Turret {
    sweep: f32,
}

impl Default for Turret {
    fn default() -> Self {
        Self { sweep: 15.0 }
    }
}

#[async_trait]
impl Brain for Turret {
    fn name(&self) -> &'static str {
        "turret"
    }

    async fn run(&mut self, robot: &RobotClient) -> Result<(), AgentError> {
        robot.turn_turret_left(self.sweep).await?.outcome().await?;
        robot.shoot().await
    }
}
