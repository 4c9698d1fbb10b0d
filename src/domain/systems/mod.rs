// Per-tick simulation systems operating on the battle's entity sets.

pub mod collision;
pub mod explosions;
pub mod movement;
pub mod projectiles;
pub mod rotation;

use super::command::CommandStatus;

/// Result of stepping one active command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The command stays in its slot for the next tick.
    Active,
    /// The command reached its terminal state; `status` is echoed in the callback.
    Finished { status: Option<CommandStatus> },
}
