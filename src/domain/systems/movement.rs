use super::StepOutcome;
use super::collision::{find_robot_collision, wall_collision};
use crate::domain::arena::Arena;
use crate::domain::command::{CommandKind, CommandStatus};
use crate::domain::math::heading;
use crate::domain::state::Robot;
use crate::domain::tuning::RobotTuning;
use tracing::debug;

/// Outcome of one MOVE step, plus the robot it ran into, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveStep {
    pub outcome: StepOutcome,
    pub rammed: Option<usize>,
}

impl MoveStep {
    fn finished(status: CommandStatus) -> Self {
        Self {
            outcome: StepOutcome::Finished {
                status: Some(status),
            },
            rammed: None,
        }
    }
}

/// Advances the active MOVE of `robots[index]` by one unit step.
///
/// The prospective position is tested before it is committed: a wall hit costs the mover
/// `wall_damage`, touching another robot costs both `collision_damage` and reports that
/// robot's index in `rammed`. In every terminal case the robot stays where it was.
pub fn step_move(
    robots: &mut [Robot],
    index: usize,
    arena: &Arena,
    cfg: &RobotTuning,
) -> MoveStep {
    let robot = &mut robots[index];
    let Some(cmd) = robot.commands.active_mut(CommandKind::Move) else {
        return MoveStep {
            outcome: StepOutcome::Active,
            rammed: None,
        };
    };

    cmd.progress += 1;
    let progress = cmd.progress;
    let distance = cmd.magnitude.abs();
    let sign = cmd.sign();

    let (dir_x, dir_y) = heading(robot.direction);
    let new_x = robot.x + sign * cfg.move_step * dir_x;
    let new_y = robot.y + sign * cfg.move_step * dir_y;

    if wall_collision(arena, new_x, new_y) {
        robot.health -= cfg.wall_damage;
        debug!(robot_id = %robot.id, x = new_x, y = new_y, hp = robot.health, "wall collision");
        return MoveStep::finished(CommandStatus::WallCollide);
    }

    if let Some(enemy) = find_robot_collision(robots, index, new_x, new_y, cfg.collision_radius) {
        robots[enemy].health -= cfg.collision_damage;
        robots[index].health -= cfg.collision_damage;
        debug!(
            robot_id = %robots[index].id,
            enemy_id = %robots[enemy].id,
            "robot collision"
        );
        return MoveStep {
            rammed: Some(enemy),
            ..MoveStep::finished(CommandStatus::EnemyCollide)
        };
    }

    if progress as f32 > distance {
        return MoveStep::finished(CommandStatus::Done);
    }

    let robot = &mut robots[index];
    robot.x = new_x;
    robot.y = new_y;
    MoveStep {
        outcome: StepOutcome::Active,
        rammed: None,
    }
}
