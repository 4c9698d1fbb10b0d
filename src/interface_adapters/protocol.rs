// Wire protocol DTOs and conversions.
// Agent traffic is tagged by `signal`; spectator traffic reuses the `type`/`data` envelope.

use crate::domain::{
    AgentCommand, BulletSnapshot, CallbackId, CommandStatus, ExplosionSnapshot, RobotEvent,
    RobotSnapshot,
};
use crate::use_cases::{BattleStatus, WorldUpdate};
use serde::{Deserialize, Serialize};

/// Messages an agent sends to the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal")]
pub enum AgentMessage {
    #[serde(rename = "MOVE")]
    Move {
        distance: f32,
        #[serde(default, alias = "callbackId", skip_serializing_if = "Option::is_none")]
        callback_id: Option<CallbackId>,
    },
    #[serde(rename = "ROTATE")]
    Rotate {
        angle: f32,
        #[serde(default, alias = "callbackId", skip_serializing_if = "Option::is_none")]
        callback_id: Option<CallbackId>,
    },
    #[serde(rename = "ROTATE_TURRET")]
    RotateTurret {
        angle: f32,
        #[serde(default, alias = "callbackId", skip_serializing_if = "Option::is_none")]
        callback_id: Option<CallbackId>,
    },
    #[serde(rename = "SHOOT")]
    Shoot,
}

/// Messages the authority sends to one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal")]
pub enum AuthorityMessage {
    #[serde(rename = "INFO")]
    Info {
        #[serde(alias = "arenaWidth")]
        arena_width: f32,
        #[serde(alias = "arenaHeight")]
        arena_height: f32,
    },
    #[serde(rename = "RUN")]
    Run,
    #[serde(rename = "CALLBACK")]
    Callback {
        #[serde(default, alias = "callbackId", skip_serializing_if = "Option::is_none")]
        callback_id: Option<CallbackId>,
        // Turret rotations complete without a status.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<CommandStatusDto>,
    },
    // Shot acknowledgement carrying the shooter's position.
    #[serde(rename = "UPDATE")]
    Update { x: f32, y: f32 },
    // Position notice after a stepped command.
    #[serde(rename = "update")]
    Position { x: f32, y: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandStatusDto {
    Done,
    WallCollide,
    EnemyCollide,
}

impl From<CommandStatus> for CommandStatusDto {
    fn from(status: CommandStatus) -> Self {
        match status {
            CommandStatus::Done => CommandStatusDto::Done,
            CommandStatus::WallCollide => CommandStatusDto::WallCollide,
            CommandStatus::EnemyCollide => CommandStatusDto::EnemyCollide,
        }
    }
}

impl From<CommandStatusDto> for CommandStatus {
    fn from(status: CommandStatusDto) -> Self {
        match status {
            CommandStatusDto::Done => CommandStatus::Done,
            CommandStatusDto::WallCollide => CommandStatus::WallCollide,
            CommandStatusDto::EnemyCollide => CommandStatus::EnemyCollide,
        }
    }
}

impl From<RobotEvent> for AuthorityMessage {
    fn from(event: RobotEvent) -> Self {
        match event {
            RobotEvent::Info {
                arena_width,
                arena_height,
            } => AuthorityMessage::Info {
                arena_width,
                arena_height,
            },
            RobotEvent::Run => AuthorityMessage::Run,
            RobotEvent::Callback {
                callback_id,
                status,
            } => AuthorityMessage::Callback {
                callback_id,
                status: status.map(CommandStatusDto::from),
            },
            RobotEvent::ShotAck { x, y } => AuthorityMessage::Update { x, y },
            RobotEvent::Position { x, y } => AuthorityMessage::Position { x, y },
        }
    }
}

/// Reasons an inbound agent message is discarded.
#[derive(Debug)]
pub enum ProtocolError {
    Malformed(serde_json::Error),
    InvalidMagnitude { field: &'static str, value: f32 },
}

impl TryFrom<AgentMessage> for AgentCommand {
    type Error = ProtocolError;

    fn try_from(message: AgentMessage) -> Result<Self, Self::Error> {
        fn finite(field: &'static str, value: f32) -> Result<f32, ProtocolError> {
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ProtocolError::InvalidMagnitude { field, value })
            }
        }

        Ok(match message {
            AgentMessage::Move {
                distance,
                callback_id,
            } => AgentCommand::Move {
                distance: finite("distance", distance)?,
                callback_id,
            },
            AgentMessage::Rotate { angle, callback_id } => AgentCommand::Rotate {
                angle: finite("angle", angle)?,
                callback_id,
            },
            AgentMessage::RotateTurret { angle, callback_id } => AgentCommand::RotateTurret {
                angle: finite("angle", angle)?,
                callback_id,
            },
            AgentMessage::Shoot => AgentCommand::Shoot,
        })
    }
}

/// Parses and validates one text frame from an agent.
pub fn parse_agent_message(text: &str) -> Result<AgentCommand, ProtocolError> {
    let message: AgentMessage = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
    AgentCommand::try_from(message)
}

/// Messages the server sends to spectators over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Snapshot of the arena for a given tick.
    WorldUpdate(WorldUpdateDto),
    // Battle lifecycle transitions.
    BattleState(BattleStatusDto),
}

/// Snapshot of the arena sent to spectators on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub robots: Vec<RobotStateDto>,
    pub bullets: Vec<BulletStateDto>,
    pub explosions: Vec<ExplosionStateDto>,
}

impl From<WorldUpdate> for WorldUpdateDto {
    fn from(update: WorldUpdate) -> Self {
        Self {
            tick: update.tick,
            robots: update.robots.iter().map(RobotStateDto::from).collect(),
            bullets: update.bullets.iter().map(BulletStateDto::from).collect(),
            explosions: update
                .explosions
                .iter()
                .map(ExplosionStateDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotStateDto {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
    pub turret_direction: f32,
    pub radar_direction: f32,
    pub health: i32,
}

impl From<&RobotSnapshot> for RobotStateDto {
    fn from(robot: &RobotSnapshot) -> Self {
        Self {
            id: robot.id.clone(),
            x: robot.x,
            y: robot.y,
            direction: robot.direction,
            turret_direction: robot.turret_direction,
            radar_direction: robot.radar_direction,
            health: robot.health,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BulletStateDto {
    pub id: u64,
    pub owner_id: String,
    pub x: f32,
    pub y: f32,
    pub direction: f32,
}

impl From<&BulletSnapshot> for BulletStateDto {
    fn from(bullet: &BulletSnapshot) -> Self {
        Self {
            id: bullet.id,
            owner_id: bullet.owner_id.clone(),
            x: bullet.x,
            y: bullet.y,
            direction: bullet.direction,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExplosionStateDto {
    pub x: f32,
    pub y: f32,
    pub progress: f32,
}

impl From<&ExplosionSnapshot> for ExplosionStateDto {
    fn from(explosion: &ExplosionSnapshot) -> Self {
        Self {
            x: explosion.x,
            y: explosion.y,
            progress: explosion.progress,
        }
    }
}

/// Battle lifecycle state for spectators and the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BattleStatusDto {
    Preparing,
    Running,
    Finished { winner: Option<String> },
}

impl From<BattleStatus> for BattleStatusDto {
    fn from(status: BattleStatus) -> Self {
        match status {
            BattleStatus::Preparing => BattleStatusDto::Preparing,
            BattleStatus::Running => BattleStatusDto::Running,
            BattleStatus::Finished { winner } => BattleStatusDto::Finished { winner },
        }
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub tick: u64,
    pub phase: BattleStatusDto,
    pub robots_alive: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn when_move_is_parsed_then_distance_and_callback_are_kept() {
        let command =
            parse_agent_message(r#"{"signal":"MOVE","distance":40,"callback_id":7}"#).unwrap();

        assert_eq!(
            command,
            AgentCommand::Move {
                distance: 40.0,
                callback_id: Some(CallbackId::Number(7)),
            }
        );
    }

    #[test]
    fn when_callback_uses_camel_case_then_it_is_accepted() {
        let command =
            parse_agent_message(r#"{"signal":"ROTATE_TURRET","angle":-45,"callbackId":"sweep"}"#)
                .unwrap();

        assert_eq!(
            command,
            AgentCommand::RotateTurret {
                angle: -45.0,
                callback_id: Some(CallbackId::Text("sweep".to_string())),
            }
        );
    }

    #[test]
    fn when_callback_id_is_negative_fractional_or_boolean_then_it_is_echoed_unchanged() {
        for raw in [json!(-1), json!(0.5), json!(true)] {
            let text = json!({"signal": "MOVE", "distance": 5, "callback_id": raw}).to_string();
            let AgentCommand::Move { callback_id, .. } = parse_agent_message(&text).unwrap() else {
                panic!("expected a MOVE for {raw}");
            };

            let echoed = serde_json::to_value(AuthorityMessage::from(RobotEvent::Callback {
                callback_id,
                status: Some(CommandStatus::Done),
            }))
            .unwrap();

            assert_eq!(echoed["callback_id"], raw);
        }
    }

    #[test]
    fn when_callback_is_missing_then_command_is_still_valid() {
        let command = parse_agent_message(r#"{"signal":"ROTATE","angle":90}"#).unwrap();

        assert_eq!(
            command,
            AgentCommand::Rotate {
                angle: 90.0,
                callback_id: None,
            }
        );
    }

    #[test]
    fn when_shoot_carries_extra_fields_then_they_are_ignored() {
        let command = parse_agent_message(r#"{"signal":"SHOOT","callback_id":3}"#).unwrap();

        assert_eq!(command, AgentCommand::Shoot);
    }

    #[test]
    fn when_signal_is_unknown_then_message_is_malformed() {
        let result = parse_agent_message(r#"{"signal":"DANCE"}"#);

        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn when_distance_is_not_a_number_then_message_is_malformed() {
        let result = parse_agent_message(r#"{"signal":"MOVE","distance":"far"}"#);

        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn when_distance_overflows_then_magnitude_is_rejected() {
        let result = parse_agent_message(r#"{"signal":"MOVE","distance":1e39}"#);

        assert!(matches!(
            result,
            Err(ProtocolError::InvalidMagnitude {
                field: "distance",
                ..
            })
        ));
    }

    #[test]
    fn when_turret_callback_is_serialized_then_status_is_omitted() {
        let message = AuthorityMessage::from(RobotEvent::Callback {
            callback_id: Some(CallbackId::Number(4)),
            status: None,
        });

        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value, json!({"signal": "CALLBACK", "callback_id": 4}));
    }

    #[test]
    fn when_collision_callback_is_serialized_then_status_is_screaming_case() {
        let message = AuthorityMessage::from(RobotEvent::Callback {
            callback_id: Some(CallbackId::Text("m1".to_string())),
            status: Some(CommandStatus::WallCollide),
        });

        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({"signal": "CALLBACK", "callback_id": "m1", "status": "WALL_COLLIDE"})
        );
    }

    #[test]
    fn when_position_and_shot_ack_are_serialized_then_signals_differ_by_case() {
        let position = serde_json::to_value(AuthorityMessage::from(RobotEvent::Position {
            x: 1.0,
            y: 2.0,
        }))
        .unwrap();
        let ack = serde_json::to_value(AuthorityMessage::from(RobotEvent::ShotAck {
            x: 1.0,
            y: 2.0,
        }))
        .unwrap();

        assert_eq!(position, json!({"signal": "update", "x": 1.0, "y": 2.0}));
        assert_eq!(ack, json!({"signal": "UPDATE", "x": 1.0, "y": 2.0}));
    }

    #[test]
    fn when_info_is_serialized_then_arena_size_is_included() {
        let value = serde_json::to_value(AuthorityMessage::from(RobotEvent::Info {
            arena_width: 800.0,
            arena_height: 400.0,
        }))
        .unwrap();

        assert_eq!(
            value,
            json!({"signal": "INFO", "arena_width": 800.0, "arena_height": 400.0})
        );
    }

    #[test]
    fn when_battle_finishes_then_state_message_names_the_winner() {
        let message = ServerMessage::BattleState(
            BattleStatus::Finished {
                winner: Some("skirmisher0".to_string()),
            }
            .into(),
        );

        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(
            value,
            json!({"type": "BattleState", "data": {"Finished": {"winner": "skirmisher0"}}})
        );
    }
}
