// Drives a brain against the authority: handshake, callback dispatch, decision loop.

use super::brains::Brain;
use super::client::{AgentError, ArenaInfo, PendingMap, RobotClient, lock_pending};
use crate::domain::RobotId;
use crate::interface_adapters::agent_channel::AgentEndpoint;
use crate::interface_adapters::protocol::AuthorityMessage;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Runs `brain` for `robot_id` until the authority closes the channel.
///
/// Once RUN has been seen, a closed channel is the normal end of a battle and yields `Ok(())`.
pub async fn run_agent(
    robot_id: RobotId,
    endpoint: AgentEndpoint,
    mut brain: Box<dyn Brain>,
) -> Result<(), AgentError> {
    let AgentEndpoint {
        to_authority,
        mut from_authority,
    } = endpoint;

    let arena = wait_for_start(&mut from_authority).await?;
    let pending = PendingMap::default();
    let (position_tx, position_rx) = watch::channel(None);
    let dispatcher = tokio::spawn(dispatch(from_authority, pending.clone(), position_tx));
    let client = RobotClient::new(robot_id, arena, to_authority, pending, position_rx);
    info!(robot_id = %client.id(), brain = brain.name(), "agent started");

    let result = loop {
        if let Err(e) = brain.run(&client).await {
            break e;
        }
        if dispatcher.is_finished() {
            break AgentError::Disconnected;
        }
    };
    dispatcher.abort();

    match result {
        AgentError::Disconnected => {
            info!(robot_id = %client.id(), "agent disconnected");
            Ok(())
        }
        other => Err(other),
    }
}

async fn wait_for_start(inbox: &mut mpsc::Receiver<String>) -> Result<ArenaInfo, AgentError> {
    let mut arena = None;
    while let Some(text) = inbox.recv().await {
        match serde_json::from_str::<AuthorityMessage>(&text) {
            Ok(AuthorityMessage::Info {
                arena_width,
                arena_height,
            }) => {
                arena = Some(ArenaInfo {
                    width: arena_width,
                    height: arena_height,
                });
            }
            Ok(AuthorityMessage::Run) => {
                return arena.ok_or(AgentError::Handshake("RUN arrived before INFO"));
            }
            Ok(other) => debug!(?other, "ignoring message before RUN"),
            Err(e) => warn!(error = ?e, "malformed authority message"),
        }
    }
    Err(AgentError::Disconnected)
}

async fn dispatch(
    mut inbox: mpsc::Receiver<String>,
    pending: PendingMap,
    position_tx: watch::Sender<Option<(f32, f32)>>,
) {
    while let Some(text) = inbox.recv().await {
        match serde_json::from_str::<AuthorityMessage>(&text) {
            Ok(AuthorityMessage::Callback {
                callback_id,
                status,
            }) => {
                let Some(callback_id) = callback_id else {
                    continue;
                };
                let slot = lock_pending(&pending).remove(&callback_id);
                match slot {
                    // The brain may have stopped waiting; that is fine.
                    Some(outcome_tx) => {
                        let _ = outcome_tx.send(status.map(Into::into));
                    }
                    None => debug!(?callback_id, "callback for unknown command"),
                }
            }
            Ok(AuthorityMessage::Update { x, y } | AuthorityMessage::Position { x, y }) => {
                let _ = position_tx.send(Some((x, y)));
            }
            Ok(other) => debug!(?other, "unexpected message after RUN"),
            Err(e) => warn!(error = ?e, "malformed authority message"),
        }
    }

    // Dropping the senders fails every outstanding outcome with Disconnected.
    lock_pending(&pending).clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CommandStatus;
    use crate::interface_adapters::agent_channel::agent_channel;
    use crate::interface_adapters::protocol::AgentMessage;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::timeout;

    struct OneMove {
        report: Option<oneshot::Sender<(Option<CommandStatus>, Option<(f32, f32)>)>>,
    }

    #[async_trait]
    impl Brain for OneMove {
        fn name(&self) -> &'static str {
            "one-move"
        }

        async fn run(&mut self, robot: &RobotClient) -> Result<(), AgentError> {
            let Some(report) = self.report.take() else {
                // Park on a command that never completes until the link closes.
                robot.turn_left(1.0).await?.outcome().await?;
                return Ok(());
            };
            let status = robot.move_forward(3.0).await?.outcome().await?;
            let _ = report.send((status, robot.position()));
            Ok(())
        }
    }

    async fn recv_json(link_rx: &mut mpsc::Receiver<String>) -> AgentMessage {
        let text = timeout(Duration::from_secs(1), link_rx.recv())
            .await
            .unwrap()
            .unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn when_callback_arrives_then_brain_sees_status_and_position() {
        let (mut link, endpoint) = agent_channel(8);
        let (report_tx, report_rx) = oneshot::channel();
        let agent = tokio::spawn(run_agent(
            "alpha".to_string(),
            endpoint,
            Box::new(OneMove {
                report: Some(report_tx),
            }),
        ));

        link.to_agent
            .send(r#"{"signal":"INFO","arena_width":800,"arena_height":400}"#.to_string())
            .await
            .unwrap();
        link.to_agent
            .send(r#"{"signal":"RUN"}"#.to_string())
            .await
            .unwrap();

        let AgentMessage::Move {
            distance,
            callback_id: Some(callback_id),
        } = recv_json(&mut link.from_agent).await
        else {
            panic!("expected a MOVE with a callback id");
        };
        assert_eq!(distance, 3.0);

        let position = serde_json::json!({"signal": "update", "x": 10.0, "y": 20.0});
        let callback = serde_json::json!({
            "signal": "CALLBACK",
            "callback_id": callback_id,
            "status": "DONE",
        });
        link.to_agent.send(position.to_string()).await.unwrap();
        link.to_agent.send(callback.to_string()).await.unwrap();

        let (status, position) = timeout(Duration::from_secs(1), report_rx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(status, Some(CommandStatus::Done));
        assert_eq!(position, Some((10.0, 20.0)));

        drop(link);
        let result = timeout(Duration::from_secs(1), agent).await.unwrap().unwrap();
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn when_run_precedes_info_then_handshake_fails() {
        let (link, endpoint) = agent_channel(8);
        link.to_agent
            .send(r#"{"signal":"RUN"}"#.to_string())
            .await
            .unwrap();

        let result = run_agent(
            "alpha".to_string(),
            endpoint,
            Box::new(OneMove { report: None }),
        )
        .await;

        assert!(matches!(result, Err(AgentError::Handshake(_))));
    }

    #[tokio::test]
    async fn when_authority_closes_before_run_then_agent_ends_quietly() {
        let (link, endpoint) = agent_channel(8);
        drop(link);

        let result = run_agent(
            "alpha".to_string(),
            endpoint,
            Box::new(OneMove { report: None }),
        )
        .await;

        assert_eq!(result, Err(AgentError::Disconnected));
    }
}
