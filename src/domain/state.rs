// Domain-level simulation entities and their read-only snapshots.

use super::command::CommandQueue;
use std::time::Duration;

pub type RobotId = String;

#[derive(Debug, Clone, PartialEq)]
pub struct RobotSnapshot {
    pub id: RobotId,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
    pub turret_direction: f32,
    pub radar_direction: f32,
    pub health: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BulletSnapshot {
    pub id: u64,
    pub owner_id: RobotId,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplosionSnapshot {
    pub x: f32,
    pub y: f32,
    pub progress: f32,
}

pub struct Robot {
    pub id: RobotId,
    pub x: f32,
    pub y: f32,

    // Headings in degrees; they accumulate and are never normalized.
    pub direction: f32,
    pub turret_direction: f32,
    pub radar_direction: f32,

    // Combat state.
    pub health: i32,
    pub last_shot_at: Option<Duration>, // simulated time of the last bullet fired

    pub commands: CommandQueue,
}

impl Robot {
    pub fn new(id: RobotId, x: f32, y: f32, direction: f32, health: i32) -> Self {
        Self {
            id,
            x,
            y,
            direction,
            turret_direction: 0.0,
            radar_direction: 0.0,
            health,
            last_shot_at: None,
            commands: CommandQueue::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

pub struct Bullet {
    pub id: u64,
    pub owner_id: RobotId,
    pub x: f32,
    pub y: f32,
    pub direction: f32, // fixed at spawn
}

pub struct Explosion {
    pub x: f32,
    pub y: f32,
    pub progress: f32,
}

impl From<&Robot> for RobotSnapshot {
    fn from(r: &Robot) -> Self {
        Self {
            id: r.id.clone(),
            x: r.x,
            y: r.y,
            direction: r.direction,
            turret_direction: r.turret_direction,
            radar_direction: r.radar_direction,
            health: r.health,
        }
    }
}

impl From<&Bullet> for BulletSnapshot {
    fn from(b: &Bullet) -> Self {
        Self {
            id: b.id,
            owner_id: b.owner_id.clone(),
            x: b.x,
            y: b.y,
            direction: b.direction,
        }
    }
}

impl From<&Explosion> for ExplosionSnapshot {
    fn from(e: &Explosion) -> Self {
        Self {
            x: e.x,
            y: e.y,
            progress: e.progress,
        }
    }
}
