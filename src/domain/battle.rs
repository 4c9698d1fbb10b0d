// Authoritative battle state: the single owner and mutator of robots, bullets and explosions.

use super::arena::Arena;
use super::command::{AgentCommand, CallbackId, CommandKind, CommandStatus, QueueError};
use super::math::distance;
use super::state::{
    Bullet, BulletSnapshot, Explosion, ExplosionSnapshot, Robot, RobotId, RobotSnapshot,
};
use super::systems::explosions::{spawn_explosion, tick_explosions};
use super::systems::movement::step_move;
use super::systems::projectiles::{fire, tick_bullets};
use super::systems::rotation::step_rotation;
use super::systems::StepOutcome;
use super::tuning::Tuning;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

const SPAWN_ATTEMPTS: usize = 64;

/// Messages the battle addresses to a single robot's agent.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotEvent {
    Info { arena_width: f32, arena_height: f32 },
    Run,
    Callback {
        callback_id: Option<CallbackId>,
        status: Option<CommandStatus>,
    },
    // Acknowledges a SHOOT request, whether or not a bullet was fired.
    ShotAck { x: f32, y: f32 },
    // Position notice after each stepped command.
    Position { x: f32, y: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub robot_id: RobotId,
    pub event: RobotEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattlePhase {
    Preparing,
    Running,
    Finished { winner: Option<RobotId> },
}

#[derive(Debug, PartialEq, Eq)]
pub enum BattleError {
    DuplicateRobot(RobotId),
    OutOfBounds(RobotId),
    ArenaFull(RobotId),
}

/// Summary of one tick for the world task.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Robots removed this tick; their agent links can be closed.
    pub retired: Vec<RobotId>,
    /// True on the tick the battle transitioned to `Finished`.
    pub finished: bool,
}

pub struct Battle {
    arena: Arena,
    tuning: Tuning,
    tick_interval: Duration,

    robots: Vec<Robot>,
    bullets: Vec<Bullet>,
    explosions: Vec<Explosion>,

    tick: u64,
    elapsed: Duration, // simulated clock: tick * tick_interval
    next_bullet_id: u64,
    contestants: usize,
    phase: BattlePhase,
    // Robots whose MOVE was cut short by a ram this tick.
    halted: Vec<usize>,

    outbox: Vec<Outbound>,
}

impl Battle {
    pub fn new(arena: Arena, tuning: Tuning, tick_interval: Duration) -> Self {
        Self {
            arena,
            tuning,
            tick_interval,
            robots: Vec::new(),
            bullets: Vec::new(),
            explosions: Vec::new(),
            tick: 0,
            elapsed: Duration::ZERO,
            next_bullet_id: 1,
            contestants: 0,
            phase: BattlePhase::Preparing,
            halted: Vec::new(),
            outbox: Vec::new(),
        }
    }

    /// Places a robot at an explicit position and greets its agent with the arena size.
    pub fn add_robot(&mut self, id: impl Into<RobotId>, x: f32, y: f32) -> Result<(), BattleError> {
        let id = id.into();
        if self.robots.iter().any(|r| r.id == id) {
            return Err(BattleError::DuplicateRobot(id));
        }
        if !self.arena.contains(x, y) {
            return Err(BattleError::OutOfBounds(id));
        }

        let robot = Robot::new(
            id.clone(),
            x,
            y,
            self.tuning.robot.spawn_direction,
            self.tuning.robot.max_health,
        );
        self.robots.push(robot);
        self.contestants += 1;
        info!(robot_id = %id, x, y, "robot spawned");

        self.push_event(
            id,
            RobotEvent::Info {
                arena_width: self.arena.width,
                arena_height: self.arena.height,
            },
        );
        Ok(())
    }

    /// Places a robot at a random spot inside the spawn margin, away from other robots.
    pub fn spawn_robot<R: Rng>(
        &mut self,
        id: impl Into<RobotId>,
        rng: &mut R,
    ) -> Result<(), BattleError> {
        let id = id.into();
        let margin = self
            .tuning
            .robot
            .spawn_margin
            .max(self.arena.wall_margin)
            .min(self.arena.width.min(self.arena.height) / 2.0);
        let clearance = self.tuning.robot.collision_radius;

        for _ in 0..SPAWN_ATTEMPTS {
            let x = rng.gen_range(margin..=self.arena.width - margin);
            let y = rng.gen_range(margin..=self.arena.height - margin);
            let free = self
                .robots
                .iter()
                .all(|r| distance(x, y, r.x, r.y) >= clearance);
            if free {
                return self.add_robot(id, x, y);
            }
        }
        Err(BattleError::ArenaFull(id))
    }

    /// Signals every agent that it may start issuing commands.
    pub fn start(&mut self) {
        if self.phase != BattlePhase::Preparing {
            return;
        }
        let ids: Vec<RobotId> = self.robots.iter().map(|r| r.id.clone()).collect();
        for id in ids {
            self.push_event(id, RobotEvent::Run);
        }
        self.phase = BattlePhase::Running;
        info!(robots = self.robots.len(), "battle started");
    }

    /// Applies one inbound agent request. SHOOT is resolved on arrival; everything else is
    /// queued with zero progress and stepped from the next tick on.
    pub fn submit(&mut self, robot_id: &str, command: AgentCommand) {
        let Some(index) = self.robots.iter().position(|r| r.id == robot_id) else {
            debug!(robot_id, "command for unknown or retired robot dropped");
            return;
        };

        let Some(cmd) = command.into_command() else {
            self.shoot(index);
            return;
        };

        let max_pending = self.tuning.robot.max_pending_per_kind;
        let robot = &mut self.robots[index];
        if let Err(QueueError::BacklogFull { kind, depth }) = robot.commands.push(cmd, max_pending) {
            warn!(robot_id, ?kind, depth, "command backlog full; command dropped");
        }
    }

    fn shoot(&mut self, index: usize) {
        let robot = &mut self.robots[index];
        let fired = fire(
            robot,
            &mut self.bullets,
            &mut self.next_bullet_id,
            self.elapsed,
            &self.tuning.bullet,
        );
        if let Some(bullet_id) = fired {
            debug!(robot_id = %robot.id, bullet_id, "bullet fired");
        }
        let (id, x, y) = (robot.id.clone(), robot.x, robot.y);
        self.push_event(id, RobotEvent::ShotAck { x, y });
    }

    /// Advances the battle by one fixed step.
    pub fn tick(&mut self) -> TickReport {
        let retired = self.retire_dead_robots();

        tick_bullets(
            &mut self.robots,
            &mut self.bullets,
            &mut self.explosions,
            &self.arena,
            &self.tuning.bullet,
            &self.tuning.explosion,
        );

        self.halted.clear();
        for index in 0..self.robots.len() {
            self.step_commands(index);
            self.robots[index].radar_direction += self.tuning.robot.radar_sweep_step;
        }

        tick_explosions(&mut self.explosions, &self.tuning.explosion);

        self.tick += 1;
        self.elapsed += self.tick_interval;

        TickReport {
            tick: self.tick,
            retired,
            finished: self.evaluate_phase(),
        }
    }

    fn retire_dead_robots(&mut self) -> Vec<RobotId> {
        let mut retired = Vec::new();
        let explosion_cfg = self.tuning.explosion;
        let explosions = &mut self.explosions;
        self.robots.retain(|r| {
            if r.is_alive() {
                return true;
            }
            explosions.push(spawn_explosion(r.x, r.y, &explosion_cfg));
            info!(robot_id = %r.id, x = r.x, y = r.y, "robot destroyed");
            retired.push(r.id.clone());
            false
        });
        retired
    }

    fn step_commands(&mut self, index: usize) {
        for kind in CommandKind::ALL {
            if self.robots[index].commands.active(kind).is_none() {
                continue;
            }
            // A MOVE promoted by a ram waits for the next tick.
            if kind == CommandKind::Move && self.halted.contains(&index) {
                continue;
            }

            let outcome = match kind {
                CommandKind::Move => {
                    let step = step_move(&mut self.robots, index, &self.arena, &self.tuning.robot);
                    if let Some(enemy) = step.rammed {
                        self.interrupt_move(enemy);
                    }
                    step.outcome
                }
                CommandKind::Rotate | CommandKind::RotateTurret => {
                    step_rotation(&mut self.robots[index], kind, &self.tuning.robot)
                }
            };

            let robot = &mut self.robots[index];
            let id = robot.id.clone();
            let (x, y) = (robot.x, robot.y);
            if let StepOutcome::Finished { status } = outcome {
                let callback_id = robot.commands.complete(kind).and_then(|c| c.callback_id);
                debug!(robot_id = %id, ?kind, ?status, ?callback_id, "command finished");
                self.push_event(id.clone(), RobotEvent::Callback { callback_id, status });
            }
            self.push_event(id, RobotEvent::Position { x, y });
        }
    }

    // A robot that gets rammed while driving itself stops with the same outcome as the
    // rammer; the contact damage was already applied once to both.
    fn interrupt_move(&mut self, index: usize) {
        let robot = &mut self.robots[index];
        let Some(cmd) = robot.commands.complete(CommandKind::Move) else {
            return;
        };
        self.halted.push(index);
        let id = robot.id.clone();
        let (x, y) = (robot.x, robot.y);
        self.push_event(
            id.clone(),
            RobotEvent::Callback {
                callback_id: cmd.callback_id,
                status: Some(CommandStatus::EnemyCollide),
            },
        );
        self.push_event(id, RobotEvent::Position { x, y });
    }

    fn evaluate_phase(&mut self) -> bool {
        if self.phase != BattlePhase::Running {
            return false;
        }

        let alive: Vec<&Robot> = self.robots.iter().filter(|r| r.is_alive()).collect();
        let finished = match self.contestants {
            0 => false,
            1 => alive.is_empty(),
            _ => alive.len() <= 1,
        };
        if !finished {
            return false;
        }

        // A solo battle has nobody to beat.
        let winner = match self.contestants {
            1 => None,
            _ => alive.first().map(|r| r.id.clone()),
        };
        info!(tick = self.tick, winner = ?winner, "battle finished");
        self.phase = BattlePhase::Finished { winner };
        true
    }

    fn push_event(&mut self, robot_id: RobotId, event: RobotEvent) {
        self.outbox.push(Outbound { robot_id, event });
    }

    /// Takes every message produced since the last drain, in production order.
    pub fn drain_outbox(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    pub fn phase(&self) -> &BattlePhase {
        &self.phase
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn robots_alive(&self) -> usize {
        self.robots.iter().filter(|r| r.is_alive()).count()
    }

    /// No dead robot awaiting retirement, no bullet in flight and no explosion still animating.
    pub fn is_settled(&self) -> bool {
        self.robots.iter().all(Robot::is_alive)
            && self.bullets.is_empty()
            && self.explosions.is_empty()
    }

    pub fn robot(&self, id: &str) -> Option<RobotSnapshot> {
        self.robots
            .iter()
            .find(|r| r.id == id)
            .map(RobotSnapshot::from)
    }

    pub fn robot_snapshots(&self) -> Vec<RobotSnapshot> {
        self.robots.iter().map(RobotSnapshot::from).collect()
    }

    pub fn bullet_snapshots(&self) -> Vec<BulletSnapshot> {
        self.bullets.iter().map(BulletSnapshot::from).collect()
    }

    pub fn explosion_snapshots(&self) -> Vec<ExplosionSnapshot> {
        self.explosions.iter().map(ExplosionSnapshot::from).collect()
    }
}
