// Network adapters: the spectator WebSocket stream and the status endpoint.

pub mod spectator;

pub use spectator::{BattleSummary, spawn_battle_serializer, status_handler, ws_handler};
