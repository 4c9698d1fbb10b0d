use crate::domain::tuning::FirePolicy;
use std::{
    env,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

// Runtime/server configuration (not gameplay tuning).

pub const DEFAULT_CONTESTANTS: &str = "skirmisher,skirmisher,turret";

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let millis = env::var("ARENA_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(5);
    Duration::from_millis(millis)
}

/// Brain names, one robot each, in roster order.
pub fn contestants() -> Vec<String> {
    let raw = env::var("ARENA_CONTESTANTS").unwrap_or_else(|_| DEFAULT_CONTESTANTS.to_string());
    parse_contestants(&raw)
}

/// Spawn seed; a fresh one per run unless `ARENA_SEED` pins it.
pub fn battle_seed() -> u64 {
    env::var("ARENA_SEED")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos() as u64
        })
}

pub fn fire_policy() -> FirePolicy {
    env::var("ARENA_FIRE_POLICY")
        .ok()
        .and_then(|value| parse_fire_policy(&value))
        .unwrap_or(FirePolicy::Cooldown)
}

pub fn parse_contestants(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_fire_policy(raw: &str) -> Option<FirePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cooldown" => Some(FirePolicy::Cooldown),
        "single" | "single_bullet" => Some(FirePolicy::SingleBullet),
        _ => None,
    }
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;
pub const AGENT_CHANNEL_CAPACITY: usize = 256;
