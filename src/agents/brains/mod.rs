mod skirmisher;
mod turret;

pub use skirmisher::Skirmisher;
pub use turret::Turret;

use super::client::{AgentError, RobotClient};
use async_trait::async_trait;

/// Names accepted by [`brain_by_name`].
pub const BRAIN_NAMES: [&str; 2] = ["skirmisher", "turret"];

/// Decision logic for one robot.
#[async_trait]
pub trait Brain: Send {
    fn name(&self) -> &'static str;

    /// One decision round; the runtime calls it again as soon as it returns.
    async fn run(&mut self, robot: &RobotClient) -> Result<(), AgentError>;
}

pub fn brain_by_name(name: &str, seed: u64) -> Option<Box<dyn Brain>> {
    match name {
        "skirmisher" => Some(Box::new(Skirmisher::new(seed))),
        "turret" => Some(Box::new(Turret::default())),
        _ => None,
    }
}
