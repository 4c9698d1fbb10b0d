// Per-robot message channel between the authority and one agent.
// Each side sees JSON text frames only; the bridge owns parsing and serialization.

use crate::domain::RobotId;
use crate::interface_adapters::protocol::{AuthorityMessage, parse_agent_message};
use crate::interface_adapters::utils::log_throttle::{should_log, throttle_start};
use crate::use_cases::{GameEvent, RobotPort};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Authority end of an agent channel.
pub struct AgentLink {
    pub from_agent: mpsc::Receiver<String>,
    pub to_agent: mpsc::Sender<String>,
}

/// Agent end of an agent channel.
pub struct AgentEndpoint {
    pub to_authority: mpsc::Sender<String>,
    pub from_authority: mpsc::Receiver<String>,
}

/// Creates a connected pair of ends, each direction buffering up to `capacity` frames.
pub fn agent_channel(capacity: usize) -> (AgentLink, AgentEndpoint) {
    let (to_authority, from_agent) = mpsc::channel(capacity);
    let (to_agent, from_authority) = mpsc::channel(capacity);
    (
        AgentLink {
            from_agent,
            to_agent,
        },
        AgentEndpoint {
            to_authority,
            from_authority,
        },
    )
}

#[derive(Debug, Default)]
struct BridgeStats {
    msgs_in: u64,
    msgs_out: u64,
    invalid: u64,
}

/// Pumps frames between one agent and the world task until the robot's event stream ends.
///
/// Malformed frames are dropped with a throttled warning. When the agent hangs up the world
/// task is told to detach the robot, and outbound events are drained until the robot retires.
pub async fn run_agent_bridge(
    port: RobotPort,
    mut link: AgentLink,
    input_tx: mpsc::Sender<GameEvent>,
) {
    let RobotPort {
        robot_id,
        mut events_rx,
    } = port;
    let mut stats = BridgeStats::default();
    let mut last_invalid_log = throttle_start();
    let mut agent_open = true;
    let mut agent_listening = true;

    loop {
        tokio::select! {
            frame = link.from_agent.recv(), if agent_open => {
                match frame {
                    Some(text) => {
                        stats.msgs_in += 1;
                        match parse_agent_message(&text) {
                            Ok(command) => {
                                let event = GameEvent::Command {
                                    robot_id: robot_id.clone(),
                                    command,
                                };
                                if input_tx.send(event).await.is_err() {
                                    debug!(%robot_id, "world task gone; closing agent bridge");
                                    break;
                                }
                            }
                            Err(e) => {
                                stats.invalid += 1;
                                if should_log(&mut last_invalid_log) {
                                    warn!(
                                        %robot_id,
                                        error = ?e,
                                        len = text.len(),
                                        invalid = stats.invalid,
                                        "discarding invalid agent message"
                                    );
                                }
                            }
                        }
                    }
                    None => {
                        agent_open = false;
                        info!(%robot_id, "agent hung up");
                        detach(&robot_id, &input_tx).await;
                    }
                }
            }

            event = events_rx.recv() => {
                let Some(event) = event else {
                    debug!(%robot_id, "robot event stream ended");
                    break;
                };
                if !agent_listening {
                    continue;
                }
                let text = match serde_json::to_string(&AuthorityMessage::from(event)) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(%robot_id, error = ?e, "failed to serialize robot event");
                        continue;
                    }
                };
                if link.to_agent.send(text).await.is_err() {
                    agent_listening = false;
                    debug!(%robot_id, "agent stopped listening");
                } else {
                    stats.msgs_out += 1;
                }
            }
        }
    }

    info!(
        %robot_id,
        msgs_in = stats.msgs_in,
        msgs_out = stats.msgs_out,
        invalid = stats.invalid,
        "agent bridge closed"
    );
}

async fn detach(robot_id: &RobotId, input_tx: &mpsc::Sender<GameEvent>) {
    let event = GameEvent::Detached {
        robot_id: robot_id.clone(),
    };
    if input_tx.send(event).await.is_err() {
        debug!(%robot_id, "world task gone before detach");
    }
}
