// Battle launch: validates the roster, places robots and wires the world task channels.

use super::game::world_task;
use super::types::{BattleStatus, GameEvent, WorldUpdate};
use crate::domain::{Arena, Battle, BattleError, RobotEvent, RobotId, Tuning};
use axum::extract::ws::Utf8Bytes;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tracing::info;

/// Settings for spawning a battle world.
#[derive(Debug, Clone)]
pub struct BattleSettings {
    /// Capacity for inbound agent commands.
    pub input_channel_capacity: usize,
    /// Capacity for broadcast world updates.
    pub world_broadcast_capacity: usize,
    /// Fixed tick interval for the battle loop.
    pub tick_interval: Duration,
    pub arena: Arena,
    pub tuning: Tuning,
    /// Seed for spawn placement; the same seed and roster give the same start.
    pub seed: u64,
}

/// Errors returned when a battle cannot be set up.
#[derive(Debug, PartialEq, Eq)]
pub enum LaunchError {
    EmptyRoster,
    DuplicateRobot(RobotId),
    ArenaFull(RobotId),
}

/// Channels and controls for a running battle.
#[derive(Clone)]
pub struct BattleHandle {
    /// Sender for agent commands into the world task.
    pub input_tx: mpsc::Sender<GameEvent>,
    /// Broadcast sender for raw world updates.
    pub world_tx: broadcast::Sender<WorldUpdate>,
    /// Broadcast sender for serialized world updates.
    pub world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    /// Watch sender holding the latest serialized world update.
    pub world_latest_tx: watch::Sender<Utf8Bytes>,
    /// Watch sender for battle phase changes.
    pub status_tx: watch::Sender<BattleStatus>,
    shutdown: Arc<Notify>,
}

impl BattleHandle {
    /// Stops the world task at its next tick boundary.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// Authority side of one robot: the events the world task addresses to it.
pub struct RobotPort {
    pub robot_id: RobotId,
    pub events_rx: mpsc::UnboundedReceiver<RobotEvent>,
}

/// Places every robot of the roster and spawns the authoritative world task.
pub fn launch_battle(
    settings: &BattleSettings,
    roster: Vec<RobotId>,
) -> Result<(BattleHandle, Vec<RobotPort>), LaunchError> {
    if roster.is_empty() {
        return Err(LaunchError::EmptyRoster);
    }
    let mut seen = HashSet::new();
    if let Some(dup) = roster.iter().find(|id| !seen.insert(id.as_str())) {
        return Err(LaunchError::DuplicateRobot(dup.clone()));
    }

    let mut battle = Battle::new(settings.arena, settings.tuning, settings.tick_interval);
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut agents = HashMap::new();
    let mut ports = Vec::with_capacity(roster.len());
    for robot_id in roster {
        battle
            .spawn_robot(robot_id.clone(), &mut rng)
            .map_err(|e| match e {
                BattleError::DuplicateRobot(id) => LaunchError::DuplicateRobot(id),
                BattleError::OutOfBounds(id) | BattleError::ArenaFull(id) => {
                    LaunchError::ArenaFull(id)
                }
            })?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        agents.insert(robot_id.clone(), events_tx);
        ports.push(RobotPort {
            robot_id,
            events_rx,
        });
    }

    // Channel wiring for the battle world loop.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(settings.input_channel_capacity);
    let (world_tx, _world_rx) =
        broadcast::channel::<WorldUpdate>(settings.world_broadcast_capacity);
    let (world_bytes_tx, _world_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(settings.world_broadcast_capacity);
    let (world_latest_tx, _world_latest_rx) = watch::channel::<Utf8Bytes>(Utf8Bytes::from(""));
    let (status_tx, _status_rx) = watch::channel::<BattleStatus>(BattleStatus::Preparing);
    let shutdown = Arc::new(Notify::new());

    info!(
        robots = ports.len(),
        seed = settings.seed,
        tick_ms = settings.tick_interval.as_millis() as u64,
        "launching battle"
    );

    // Spawn the authoritative world loop for this battle.
    tokio::spawn(world_task(
        battle,
        input_rx,
        agents,
        world_tx.clone(),
        status_tx.clone(),
        settings.tick_interval,
        shutdown.clone(),
    ));

    let handle = BattleHandle {
        input_tx,
        world_tx,
        world_bytes_tx,
        world_latest_tx,
        status_tx,
        shutdown,
    };
    Ok((handle, ports))
}
