// Robot commands and the per-kind slot table they are queued in.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// Opaque token supplied by an agent and echoed back with the command outcome.
///
/// Any JSON scalar is accepted; variant order decides which one a number lands in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallbackId {
    Number(u64),
    Signed(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

// JSON cannot carry NaN, so float ids compare reflexively.
impl Eq for CallbackId {}

impl Hash for CallbackId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Number(n) => n.hash(state),
            Self::Signed(n) => n.hash(state),
            // 0.0 and -0.0 are equal and must hash alike.
            Self::Float(f) if *f == 0.0 => 0u64.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Text(s) => s.hash(state),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Move,
    Rotate,
    RotateTurret,
}

impl CommandKind {
    /// Stepping order within one robot; stable across ticks.
    pub const ALL: [CommandKind; 3] = [
        CommandKind::Move,
        CommandKind::Rotate,
        CommandKind::RotateTurret,
    ];

    fn slot(self) -> usize {
        match self {
            CommandKind::Move => 0,
            CommandKind::Rotate => 1,
            CommandKind::RotateTurret => 2,
        }
    }
}

/// Terminal outcome reported once per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Done,
    WallCollide,
    EnemyCollide,
}

/// A validated agent request, ready to be applied by the battle.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCommand {
    Move {
        distance: f32,
        callback_id: Option<CallbackId>,
    },
    Rotate {
        angle: f32,
        callback_id: Option<CallbackId>,
    },
    RotateTurret {
        angle: f32,
        callback_id: Option<CallbackId>,
    },
    Shoot,
}

impl AgentCommand {
    /// Converts a queueable request into a fresh command; SHOOT is not queued.
    pub fn into_command(self) -> Option<Command> {
        let (kind, magnitude, callback_id) = match self {
            AgentCommand::Move {
                distance,
                callback_id,
            } => (CommandKind::Move, distance, callback_id),
            AgentCommand::Rotate { angle, callback_id } => (CommandKind::Rotate, angle, callback_id),
            AgentCommand::RotateTurret { angle, callback_id } => {
                (CommandKind::RotateTurret, angle, callback_id)
            }
            AgentCommand::Shoot => return None,
        };
        Some(Command {
            kind,
            magnitude,
            callback_id,
            progress: 0,
        })
    }
}

/// One in-flight multi-tick action.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    /// Signed distance (MOVE) or signed angle in degrees; the sign picks the direction.
    pub magnitude: f32,
    pub callback_id: Option<CallbackId>,
    /// Steps taken so far.
    pub progress: u32,
}

impl Command {
    /// +1 for positive magnitudes, -1 otherwise.
    pub fn sign(&self) -> f32 {
        if self.magnitude > 0.0 { 1.0 } else { -1.0 }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The backlog for this kind is already at its configured depth.
    BacklogFull { kind: CommandKind, depth: usize },
}

/// Per-robot command table: at most one active command per kind, later arrivals wait in a
/// FIFO backlog for their kind.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    active: [Option<Command>; 3],
    backlog: [VecDeque<Command>; 3],
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates the command if its slot is free, otherwise appends it to the backlog.
    pub fn push(&mut self, command: Command, max_pending: usize) -> Result<(), QueueError> {
        let slot = command.kind.slot();
        if self.active[slot].is_none() {
            self.active[slot] = Some(command);
            return Ok(());
        }

        let backlog = &mut self.backlog[slot];
        if backlog.len() >= max_pending {
            return Err(QueueError::BacklogFull {
                kind: command.kind,
                depth: backlog.len(),
            });
        }
        backlog.push_back(command);
        Ok(())
    }

    pub fn active(&self, kind: CommandKind) -> Option<&Command> {
        self.active[kind.slot()].as_ref()
    }

    pub fn active_mut(&mut self, kind: CommandKind) -> Option<&mut Command> {
        self.active[kind.slot()].as_mut()
    }

    /// Removes the active command of `kind` and promotes the oldest waiting one.
    pub fn complete(&mut self, kind: CommandKind) -> Option<Command> {
        let slot = kind.slot();
        let finished = self.active[slot].take();
        self.active[slot] = self.backlog[slot].pop_front();
        finished
    }

    pub fn pending(&self, kind: CommandKind) -> usize {
        self.backlog[kind.slot()].len()
    }

    pub fn is_idle(&self) -> bool {
        self.active.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(kind: CommandKind, magnitude: f32, id: u64) -> Command {
        Command {
            kind,
            magnitude,
            callback_id: Some(CallbackId::Number(id)),
            progress: 0,
        }
    }

    #[test]
    fn when_ids_of_every_json_scalar_are_used_as_keys_then_each_is_found_again() {
        let ids: Vec<CallbackId> =
            serde_json::from_str(r#"[7, -1, 0.5, -0.0, true, "m1"]"#).unwrap();
        assert_eq!(
            ids,
            vec![
                CallbackId::Number(7),
                CallbackId::Signed(-1),
                CallbackId::Float(0.5),
                CallbackId::Float(-0.0),
                CallbackId::Bool(true),
                CallbackId::Text("m1".to_string()),
            ]
        );

        let keys: std::collections::HashSet<CallbackId> = ids.iter().cloned().collect();
        assert_eq!(keys.len(), ids.len());
        assert!(keys.contains(&CallbackId::Float(0.0)));
    }

    #[test]
    fn when_slot_is_free_then_command_becomes_active() {
        let mut queue = CommandQueue::new();
        queue.push(command(CommandKind::Move, 10.0, 1), 4).unwrap();

        assert_eq!(queue.active(CommandKind::Move).unwrap().magnitude, 10.0);
        assert_eq!(queue.pending(CommandKind::Move), 0);
        assert!(!queue.is_idle());
    }

    #[test]
    fn when_second_move_arrives_then_it_waits_behind_the_active_one() {
        let mut queue = CommandQueue::new();
        queue.push(command(CommandKind::Move, 10.0, 1), 4).unwrap();
        queue.push(command(CommandKind::Move, 20.0, 2), 4).unwrap();

        assert_eq!(
            queue.active(CommandKind::Move).unwrap().callback_id,
            Some(CallbackId::Number(1))
        );
        assert_eq!(queue.pending(CommandKind::Move), 1);

        let finished = queue.complete(CommandKind::Move).unwrap();
        assert_eq!(finished.callback_id, Some(CallbackId::Number(1)));
        assert_eq!(
            queue.active(CommandKind::Move).unwrap().callback_id,
            Some(CallbackId::Number(2))
        );
        assert_eq!(queue.pending(CommandKind::Move), 0);
    }

    #[test]
    fn when_kinds_differ_then_commands_run_side_by_side() {
        let mut queue = CommandQueue::new();
        queue.push(command(CommandKind::Move, 10.0, 1), 4).unwrap();
        queue.push(command(CommandKind::RotateTurret, 45.0, 2), 4).unwrap();

        assert!(queue.active(CommandKind::Move).is_some());
        assert!(queue.active(CommandKind::RotateTurret).is_some());
        assert!(queue.active(CommandKind::Rotate).is_none());
    }

    #[test]
    fn when_backlog_is_full_then_push_is_rejected() {
        let mut queue = CommandQueue::new();
        queue.push(command(CommandKind::Rotate, 10.0, 1), 1).unwrap();
        queue.push(command(CommandKind::Rotate, 10.0, 2), 1).unwrap();

        let result = queue.push(command(CommandKind::Rotate, 10.0, 3), 1);
        assert_eq!(
            result,
            Err(QueueError::BacklogFull {
                kind: CommandKind::Rotate,
                depth: 1
            })
        );
    }

    #[test]
    fn when_shoot_is_converted_then_no_command_is_produced() {
        assert!(AgentCommand::Shoot.into_command().is_none());
        let rotate = AgentCommand::Rotate {
            angle: -30.0,
            callback_id: None,
        }
        .into_command()
        .unwrap();
        assert_eq!(rotate.kind, CommandKind::Rotate);
        assert_eq!(rotate.sign(), -1.0);
        assert_eq!(rotate.progress, 0);
    }
}
