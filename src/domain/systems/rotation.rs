use super::StepOutcome;
use crate::domain::command::{CommandKind, CommandStatus};
use crate::domain::state::Robot;
use crate::domain::tuning::RobotTuning;

/// Advances the active ROTATE or ROTATE_TURRET of a robot by one degree step.
///
/// The command finishes on the step where `progress` already equals the whole-degree part
/// of `|angle|`, so an angle of 90 turns for 90 ticks and reports on the 91st.
/// Turret rotations finish without a status.
pub fn step_rotation(robot: &mut Robot, kind: CommandKind, cfg: &RobotTuning) -> StepOutcome {
    let Some(cmd) = robot.commands.active_mut(kind) else {
        return StepOutcome::Active;
    };

    let target = cmd.magnitude.abs().floor() as u32;
    if cmd.progress >= target {
        let status = match kind {
            CommandKind::RotateTurret => None,
            _ => Some(CommandStatus::Done),
        };
        return StepOutcome::Finished { status };
    }

    let delta = cmd.sign() * cfg.rotation_step;
    cmd.progress += 1;
    match kind {
        CommandKind::Rotate => robot.direction += delta,
        CommandKind::RotateTurret => robot.turret_direction += delta,
        CommandKind::Move => {}
    }
    StepOutcome::Active
}
